//! Parse → validate → classify for one block of element-set text.

use std::collections::HashSet;

use orbitwatch_ingest::{ClassificationPolicy, ElementSetParser};
use orbitwatch_propagate::Propagator;
use orbitwatch_store::NewObject;
use tracing::debug;

use crate::types::{GroupReport, SkipReason};

/// Run `text` through the ingest pipeline, accepting at most
/// `report.max_count` objects. Parsing stops as soon as the cap is reached.
///
/// `seen` holds names already accepted in this refresh, possibly by other
/// groups; accepted names are added to it.
pub fn collect_objects(
    text: &str,
    policy: ClassificationPolicy,
    propagator: &dyn Propagator,
    seen: &mut HashSet<String>,
    report: &mut GroupReport,
) -> Vec<NewObject> {
    let mut accepted = Vec::new();
    let mut parser = ElementSetParser::new(text);

    if report.max_count > 0 {
        for item in parser.by_ref() {
            let candidate = match item {
                Ok(c) => c,
                Err(rejection) => {
                    report.record_skip(&rejection.name, SkipReason::Parse, rejection.reason);
                    continue;
                }
            };

            if let Err(e) = propagator.validate(&candidate.elements) {
                debug!("{} failed validation: {}", candidate.name, e);
                report.record_skip(&candidate.name, SkipReason::Validation, e.to_string());
                continue;
            }

            if !seen.insert(candidate.name.clone()) {
                report.record_skip(
                    &candidate.name,
                    SkipReason::Duplicate,
                    format!("repeated at line {}", candidate.line_number),
                );
                continue;
            }

            accepted.push(NewObject {
                category: policy.classify(&candidate.name),
                name: candidate.name,
                elements: candidate.elements,
            });

            if accepted.len() >= report.max_count {
                report.capped = true;
                break;
            }
        }
    }

    report.skipped_lines = parser.skipped_lines();
    report.accepted = accepted.len();
    accepted
}
