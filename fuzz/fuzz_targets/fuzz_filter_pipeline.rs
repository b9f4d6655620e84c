// SPDX-License-Identifier: PMPL-1.0-or-later
#![no_main]

use alerts::{AlertRecord, FilterCriteria, FilterPipeline, SelectionSet};
use chrono::Utc;
use libfuzzer_sys::fuzz_target;
use serde::Deserialize;

#[derive(Deserialize)]
struct Input {
    alerts: Vec<AlertRecord>,
    criteria: FilterCriteria,
    #[serde(default)]
    selected: Vec<String>,
}

fuzz_target!(|data: &[u8]| {
    let Ok(input) = serde_json::from_slice::<Input>(data) else {
        return;
    };

    let pipeline = FilterPipeline::new(input.criteria);
    let now = Utc::now();
    let visible = pipeline.evaluate_at(&input.alerts, now);

    // Visible records keep collection order
    let mut cursor = input.alerts.iter();
    for record in &visible {
        assert!(cursor.any(|candidate| std::ptr::eq(candidate, *record)));
    }
    assert_eq!(visible, pipeline.evaluate_at(&input.alerts, now));

    let visible_ids: Vec<&str> = visible.iter().map(|a| a.id.as_str()).collect();
    let mut selection = SelectionSet::new();
    for id in &input.selected {
        selection.toggle(id);
    }
    selection.reconcile(visible_ids.iter().copied());
    assert!(selection.iter().all(|id| visible_ids.contains(&id)));
});
