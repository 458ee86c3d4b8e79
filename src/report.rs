//! Report rendering for the CLI
//!
//! A [`Report`] is one generation round plus the state a reader needs to act on
//! it. Text output is a fixed-width table; JSON output is one document per line.

use crate::engine::Recommendation;
use crate::optimizer::{SyscallDetails, SyscallOptimizer};
use crate::resources::ResourceSnapshot;
use crate::syscalls::SyscallCategory;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::BTreeMap;
use std::io::{self, Write};

const ACTION_WIDTH: usize = 72;

#[derive(Debug, Clone, Serialize)]
pub struct Report {
    pub round: usize,
    pub generated_at: DateTime<Utc>,
    pub backend: String,
    /// Suggested client polling interval in seconds
    pub refresh_interval: u64,
    pub baseline: ResourceSnapshot,
    pub recommendations: Vec<Recommendation>,
    pub performance_data: BTreeMap<String, SyscallDetails>,
    pub categories: BTreeMap<SyscallCategory, Vec<String>>,
}

impl Report {
    /// Run a generation pass and capture everything printed for it
    pub fn collect(optimizer: &SyscallOptimizer, round: usize) -> Self {
        let recommendations = optimizer.generate_optimization_strategy();
        Self {
            round,
            generated_at: Utc::now(),
            backend: optimizer.engine().backend_name().to_string(),
            refresh_interval: optimizer.refresh_interval(),
            baseline: optimizer.store().baseline(),
            recommendations,
            performance_data: optimizer.performance_data(),
            categories: optimizer.syscall_categories(),
        }
    }

    pub fn write_json<W: Write>(&self, out: &mut W) -> io::Result<()> {
        serde_json::to_writer(&mut *out, self)?;
        writeln!(out)
    }

    pub fn write_text<W: Write>(&self, out: &mut W) -> io::Result<()> {
        writeln!(
            out,
            "=== Optimization report #{} ({}, backend: {}) ===",
            self.round,
            self.generated_at.format("%Y-%m-%d %H:%M:%S UTC"),
            self.backend
        )?;
        writeln!(
            out,
            "baseline: cpu {:.2}%  memory {:.2}%  disk {:.2}%",
            self.baseline.cpu_percent, self.baseline.memory_percent, self.baseline.disk_io_percent
        )?;
        writeln!(out)?;

        if self.performance_data.is_empty() {
            writeln!(out, "No syscalls recorded.")?;
            return Ok(());
        }

        if self.recommendations.is_empty() {
            writeln!(
                out,
                "No syscalls need attention ({} tracked).",
                self.performance_data.len()
            )?;
        } else {
            self.write_recommendations(out)?;
        }

        writeln!(out)?;
        for (category, names) in &self.categories {
            writeln!(out, "{:<18} {}", category.label(), names.join(", "))?;
        }
        Ok(())
    }

    fn write_recommendations<W: Write>(&self, out: &mut W) -> io::Result<()> {
        writeln!(
            out,
            "type                         avg secs    variance     calls syscall          action"
        )?;
        writeln!(
            out,
            "---------------------------- ---------- ----------- --------- ---------------- ------"
        )?;

        for recommendation in &self.recommendations {
            let (variance, calls) = self
                .performance_data
                .get(&recommendation.syscall)
                .map(|d| (d.record.variance, d.record.execution_count))
                .unwrap_or((0.0, 0));

            writeln!(
                out,
                "{:<28} {:>10.6} {:>11.6} {:>9} {:<16} {}",
                recommendation.recommendation_type.as_str(),
                recommendation.current_performance,
                variance,
                calls,
                recommendation.syscall,
                truncate(&recommendation.suggested_action, ACTION_WIDTH)
            )?;
        }

        writeln!(
            out,
            "---------------------------- ---------- ----------- --------- ---------------- ------"
        )?;
        writeln!(
            out,
            "{} of {} syscalls need attention",
            self.recommendations.len(),
            self.performance_data.len()
        )
    }
}

fn truncate(text: &str, width: usize) -> String {
    if text.chars().count() <= width {
        text.to_string()
    } else {
        let mut short: String = text.chars().take(width.saturating_sub(3)).collect();
        short.push_str("...");
        short
    }
}
