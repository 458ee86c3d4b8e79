//! Syscall catalog for x86_64: number -> name -> category
//!
//! Categories form a closed set; labels that are not part of it are kept
//! verbatim in [`SyscallCategory::Other`] so a producer's classification is
//! never lost.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::borrow::Cow;
use std::fmt;

/// Human classification of a syscall
#[derive(Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum SyscallCategory {
    FileIo,
    Memory,
    Process,
    Synchronization,
    Ipc,
    Time,
    Signal,
    IoMultiplexing,
    Network,
    FileSystem,
    System,
    Resource,
    User,
    Architecture,
    /// No classification was supplied
    #[default]
    Unknown,
    /// A label outside the known set
    Other(String),
}

impl SyscallCategory {
    const KNOWN: [SyscallCategory; 15] = [
        SyscallCategory::FileIo,
        SyscallCategory::Memory,
        SyscallCategory::Process,
        SyscallCategory::Synchronization,
        SyscallCategory::Ipc,
        SyscallCategory::Time,
        SyscallCategory::Signal,
        SyscallCategory::IoMultiplexing,
        SyscallCategory::Network,
        SyscallCategory::FileSystem,
        SyscallCategory::System,
        SyscallCategory::Resource,
        SyscallCategory::User,
        SyscallCategory::Architecture,
        SyscallCategory::Unknown,
    ];

    /// Parse a display label; empty labels are `Unknown`
    pub fn from_label(label: &str) -> Self {
        let label = label.trim();
        if label.is_empty() {
            return SyscallCategory::Unknown;
        }
        Self::KNOWN
            .iter()
            .find(|c| c.label() == label)
            .cloned()
            .unwrap_or_else(|| SyscallCategory::Other(label.to_string()))
    }

    pub fn label(&self) -> &str {
        match self {
            SyscallCategory::FileIo => "File I/O",
            SyscallCategory::Memory => "Memory",
            SyscallCategory::Process => "Process",
            SyscallCategory::Synchronization => "Synchronization",
            SyscallCategory::Ipc => "IPC",
            SyscallCategory::Time => "Time",
            SyscallCategory::Signal => "Signal",
            SyscallCategory::IoMultiplexing => "I/O Multiplexing",
            SyscallCategory::Network => "Network",
            SyscallCategory::FileSystem => "File System",
            SyscallCategory::System => "System",
            SyscallCategory::Resource => "Resource",
            SyscallCategory::User => "User",
            SyscallCategory::Architecture => "Architecture",
            SyscallCategory::Unknown => "Unknown",
            SyscallCategory::Other(label) => label,
        }
    }
}

impl fmt::Display for SyscallCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl From<&str> for SyscallCategory {
    fn from(label: &str) -> Self {
        Self::from_label(label)
    }
}

impl Serialize for SyscallCategory {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.label())
    }
}

impl<'de> Deserialize<'de> for SyscallCategory {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let label = String::deserialize(deserializer)?;
        Ok(Self::from_label(&label))
    }
}

/// One catalog row
#[derive(Debug, Clone)]
pub struct SyscallEntry {
    pub number: i64,
    pub name: &'static str,
    pub category: SyscallCategory,
}

macro_rules! catalog {
    ($($nr:expr => $name:expr, $cat:ident;)*) => {
        &[$(SyscallEntry {
            number: $nr,
            name: $name,
            category: SyscallCategory::$cat,
        },)*]
    };
}

static CATALOG: &[SyscallEntry] = catalog! {
    0 => "read", FileIo;
    1 => "write", FileIo;
    2 => "open", FileIo;
    3 => "close", FileIo;
    4 => "stat", FileIo;
    5 => "fstat", FileIo;
    6 => "lstat", FileIo;
    7 => "poll", IoMultiplexing;
    8 => "lseek", FileIo;
    9 => "mmap", Memory;
    10 => "mprotect", Memory;
    11 => "munmap", Memory;
    12 => "brk", Memory;
    13 => "rt_sigaction", Signal;
    14 => "rt_sigprocmask", Signal;
    16 => "ioctl", FileIo;
    21 => "access", FileIo;
    22 => "pipe", Ipc;
    23 => "select", IoMultiplexing;
    28 => "madvise", Memory;
    32 => "dup", FileIo;
    33 => "dup2", FileIo;
    35 => "nanosleep", Time;
    39 => "getpid", Process;
    41 => "socket", Network;
    42 => "connect", Network;
    43 => "accept", Network;
    44 => "sendto", Network;
    45 => "recvfrom", Network;
    56 => "clone", Process;
    57 => "fork", Process;
    59 => "execve", Process;
    60 => "exit", Process;
    61 => "wait4", Process;
    62 => "kill", Signal;
    63 => "uname", System;
    72 => "fcntl", FileIo;
    78 => "getdents", FileIo;
    79 => "getcwd", FileIo;
    83 => "mkdir", FileIo;
    84 => "rmdir", FileIo;
    85 => "creat", FileIo;
    86 => "link", FileIo;
    87 => "unlink", FileIo;
    89 => "readlink", FileIo;
    90 => "chmod", FileIo;
    92 => "chown", FileIo;
    95 => "umask", FileIo;
    96 => "gettimeofday", Time;
    97 => "getrlimit", Resource;
    102 => "getuid", User;
    104 => "getgid", User;
    105 => "setuid", User;
    106 => "setgid", User;
    118 => "fsync", FileIo;
    137 => "statfs", FileSystem;
    158 => "arch_prctl", Architecture;
    186 => "gettid", Process;
    202 => "futex", Synchronization;
    218 => "set_tid_address", Process;
    228 => "clock_gettime", Time;
    231 => "exit_group", Process;
    232 => "epoll_wait", IoMultiplexing;
    257 => "openat", FileIo;
    262 => "newfstatat", FileIo;
    293 => "pipe2", Ipc;
};

/// Look up a catalog row by syscall number
pub fn lookup(number: i64) -> Option<&'static SyscallEntry> {
    CATALOG.iter().find(|e| e.number == number)
}

/// Resolve syscall number to name
///
/// Returns the syscall name, or "unknown_NNN" if the number is not cataloged
pub fn syscall_name(number: i64) -> Cow<'static, str> {
    match lookup(number) {
        Some(entry) => Cow::Borrowed(entry.name),
        None => Cow::Owned(format!("unknown_{}", number)),
    }
}

/// Resolve syscall number to (name, category), as a kernel tracer would
pub fn resolve(number: i64) -> (Cow<'static, str>, SyscallCategory) {
    match lookup(number) {
        Some(entry) => (Cow::Borrowed(entry.name), entry.category.clone()),
        None => (syscall_name(number), SyscallCategory::Unknown),
    }
}

/// Category of a syscall by name; `Unknown` when not cataloged
pub fn category_of(name: &str) -> SyscallCategory {
    CATALOG
        .iter()
        .find(|e| e.name == name)
        .map(|e| e.category.clone())
        .unwrap_or_default()
}
