use std::time::Duration;

use serde::Serialize;

use crate::scheduler::Schedule;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct QuoteProgress {
    pub step: usize,
    pub percent: u8,
    pub label: &'static str,
    pub detail: &'static str,
}

pub const QUOTE_PROGRESS_STEPS: [(u8, &str, &str); 7] = [
    (15, "Analyzing customer requirements...", "Processing workload specifications and performance needs"),
    (30, "Configuring server specifications...", "Optimizing processor, memory, and storage configurations"),
    (45, "Calculating volume pricing...", "Applying enterprise discounts and support packages"),
    (60, "Generating warranty options...", "Including HPE Pointnext services and support tiers"),
    (75, "Creating PDF documentation...", "Formatting professional HPE-branded quotation"),
    (90, "Assigning account executive...", "Matching with specialized sales representative"),
    (100, "Quote generation complete!", "Ready for customer review and approval"),
];

/// Step `i` fires at `base + i * interval` from the moment quotation starts.
pub fn quote_progress_schedule(base: Duration, interval: Duration) -> Schedule<QuoteProgress> {
    QUOTE_PROGRESS_STEPS.iter().enumerate().fold(
        Schedule::new(),
        |schedule, (step, (percent, label, detail))| {
            let offset = base + interval * u32::try_from(step).unwrap_or(u32::MAX);
            schedule.at(offset, QuoteProgress { step, percent: *percent, label, detail })
        },
    )
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::quote_progress_schedule;

    #[test]
    fn seven_steps_at_base_plus_interval_offsets() {
        let schedule =
            quote_progress_schedule(Duration::from_millis(500), Duration::from_millis(800));
        let offsets: Vec<u128> = schedule.steps().iter().map(|step| step.at.as_millis()).collect();

        assert_eq!(offsets, vec![500, 1_300, 2_100, 2_900, 3_700, 4_500, 5_300]);
        assert_eq!(schedule.steps()[6].action.percent, 100);
    }
}
