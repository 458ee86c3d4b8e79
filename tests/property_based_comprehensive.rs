//! Property-based tests for the store update rule, policy and fallback
//! templates
//!
//! Designed to run in a few seconds as a pre-commit quality gate.

use proptest::prelude::*;
use std::sync::Arc;
use sysopt::engine::{Policy, RecommendationEngine, RecommendationType};
use sysopt::resources::{FixedSampler, ResourceDimension, ResourceSampler, ResourceSnapshot};
use sysopt::store::PerformanceStore;
use sysopt::strategy;
use sysopt::syscalls::{self, SyscallCategory};

fn times() -> impl Strategy<Value = Vec<f64>> {
    prop::collection::vec(0.0f64..1.0, 1..50)
}

fn percent() -> impl Strategy<Value = f64> {
    0.0f64..=100.0
}

/// Sampler cycling through a fixed list of snapshots
struct CyclingSampler {
    samples: Vec<ResourceSnapshot>,
    next: parking_lot::Mutex<usize>,
}

impl ResourceSampler for CyclingSampler {
    fn sample(&self) -> Result<ResourceSnapshot, sysopt::resources::SampleError> {
        let mut next = self.next.lock();
        let snapshot = self.samples[*next % self.samples.len()];
        *next += 1;
        Ok(snapshot)
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    #[test]
    fn prop_count_average_and_peak(times in times()) {
        let store = PerformanceStore::new(Arc::new(FixedSampler::default()));
        let mut previous_peak = f64::INFINITY;
        for (i, &time) in times.iter().enumerate() {
            store.record_event("read", time, "File I/O").unwrap();
            let record = store.get("read").unwrap();

            // Property: count tracks calls, peak is non-increasing
            prop_assert_eq!(record.execution_count, (i + 1) as u64);
            prop_assert!(record.peak_performance <= previous_peak);
            prop_assert!(record.variance >= 0.0);
            previous_peak = record.peak_performance;
        }

        let record = store.get("read").unwrap();
        let mean = times.iter().sum::<f64>() / times.len() as f64;
        let min = times.iter().cloned().fold(f64::INFINITY, f64::min);
        prop_assert!((record.average_time - mean).abs() < 1e-9);
        prop_assert_eq!(record.peak_performance, min);
    }

    #[test]
    fn prop_second_event_is_two_point_statistics(a in 0.0f64..1.0, b in 0.0f64..1.0) {
        let store = PerformanceStore::new(Arc::new(FixedSampler::default()));
        store.record_event("foo", a, "Memory").unwrap();
        store.record_event("foo", b, "Memory").unwrap();

        let record = store.get("foo").unwrap();
        let mean = (a + b) / 2.0;
        let variance = ((a - mean).powi(2) + (b - mean).powi(2)) / 2.0;
        prop_assert!((record.average_time - mean).abs() < 1e-12);
        prop_assert!((record.variance - variance).abs() < 1e-12);
    }

    #[test]
    fn prop_impacts_never_negative(
        baseline in (percent(), percent(), percent()),
        samples in prop::collection::vec((percent(), percent(), percent()), 1..10),
        events in 1usize..30,
    ) {
        let mut all = vec![ResourceSnapshot::new(baseline.0, baseline.1, baseline.2)];
        all.extend(samples.iter().map(|&(c, m, d)| ResourceSnapshot::new(c, m, d)));
        let store = PerformanceStore::new(Arc::new(CyclingSampler {
            samples: all,
            next: parking_lot::Mutex::new(0),
        }));

        for i in 0..events {
            store.record_event(&format!("call{}", i % 3), 0.01, "Unknown").unwrap();
            for record in store.snapshot().values() {
                for &value in record.resource_impact.values() {
                    prop_assert!((0.0..=100.0).contains(&value));
                }
            }
        }
    }

    #[test]
    fn prop_snapshot_is_idempotent(times in times()) {
        let store = PerformanceStore::new(Arc::new(FixedSampler::default()));
        for (i, &time) in times.iter().enumerate() {
            store.record_event(&format!("s{}", i % 4), time, "Unknown").unwrap();
        }
        prop_assert_eq!(store.snapshot(), store.snapshot());
    }

    #[test]
    fn prop_generate_respects_inclusion(
        times in prop::collection::vec(0.0f64..0.2, 1..20),
        threshold in 0.0f64..0.2,
    ) {
        let store = PerformanceStore::new(Arc::new(FixedSampler::default()));
        for (i, &time) in times.iter().enumerate() {
            store.record_event(&format!("s{}", i), time, "Unknown").unwrap();
        }
        let policy = Policy { performance_threshold: threshold, high_impact_threshold: 50.0 };
        let recommendations = RecommendationEngine::rule_based().generate(&store, &policy);

        let expected = times.iter().filter(|&&t| t > threshold).count();
        prop_assert_eq!(recommendations.len(), expected);
        for recommendation in &recommendations {
            prop_assert!(recommendation.current_performance > threshold);
            prop_assert_ne!(
                recommendation.recommendation_type,
                RecommendationType::CriticalResourceBottleneck
            );
        }
    }

    #[test]
    fn prop_fallback_is_one_of_the_templates(
        category in prop::sample::select(vec![
            "File I/O", "Memory", "Process", "Synchronization", "IPC", "Time", "Network", "",
        ]),
        cpu in percent(),
        memory in percent(),
        disk in percent(),
    ) {
        let store = PerformanceStore::new(Arc::new(CyclingSampler {
            samples: vec![
                ResourceSnapshot::zero(),
                ResourceSnapshot::new(cpu, memory, disk),
            ],
            next: parking_lot::Mutex::new(0),
        }));
        store.record_event("call", 0.01, category).unwrap();
        let record = store.get("call").unwrap();

        let options = strategy::templates(&SyscallCategory::from_label(category), "call");
        let suggestion = strategy::fallback_suggestion(&record);
        let (_, dominant) = record.dominant_impact();
        let index = strategy::band_index(dominant, options.len());

        prop_assert_eq!(options.len(), 3);
        prop_assert_eq!(&suggestion, &options[index]);
        prop_assert_eq!(index, ((dominant / 20.0).floor() as usize).min(2));
        prop_assert!(dominant >= record.impact(ResourceDimension::CpuPercent));
    }

    #[test]
    fn prop_syscall_name_never_panics(number in 0i64..1000) {
        let (name, category) = syscalls::resolve(number);
        prop_assert!(!name.is_empty());
        prop_assert!(name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_'));
        if syscalls::lookup(number).is_none() {
            prop_assert_eq!(name.to_string(), format!("unknown_{}", number));
            prop_assert_eq!(category, SyscallCategory::Unknown);
        }
    }
}
