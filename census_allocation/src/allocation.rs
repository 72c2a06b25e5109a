use log::{debug, error, info, warn};

use crate::config::*;
use crate::grid::CellGrid;
use crate::inventory::Inventory;

/// Where a request stands while its preferences are being tried.
#[derive(Eq, PartialEq, Debug, Clone)]
enum RequestState {
    Unassigned,
    /// The preference at this position (0 or 1) had no free slot.
    PreferenceExhausted(usize),
    Assigned { center: String, block: String, row: u32 },
    Failed(ErrorCode),
}

/// Matches each request, in order, with a free slot of its first or second preferred center.
///
/// The inventory is consumed as the requests are served: a slot is never handed out twice,
/// and a slot handed out is never returned. Donors that could not be served are returned
/// as failures, in the order in which they failed.
pub fn allocate(requests: &[DonationRequest], inventory: &mut Inventory) -> AllocationOutcome {
    info!(
        "Distributing {} boxes over {} free census slots",
        requests.len(),
        inventory.free_slot_count()
    );
    let mut assignments: Vec<SlotAssignment> = Vec::new();
    let mut failures: Vec<ErrorRecord> = Vec::new();
    let mut exhausted_centers: Vec<String> = Vec::new();

    for request in requests.iter() {
        match run_request(request, inventory, &mut exhausted_centers) {
            RequestState::Assigned { center, block, row } => {
                debug!(
                    "Slot at row {} of {} was assigned to {}",
                    row, block, request.name
                );
                assignments.push(SlotAssignment {
                    center,
                    block,
                    row,
                    name: request.name.clone(),
                    phone: request.phone.clone(),
                });
            }
            RequestState::Failed(code) => {
                error!(
                    "{:?} for donor {} phone {}",
                    code, request.name, request.phone
                );
                failures.push(ErrorRecord::new(request, code));
            }
            state => unreachable!("request left in a non-terminal state {:?}", state),
        }
    }

    let summary = inventory.summary();
    for s in summary.iter() {
        info!(
            "Census {} of center {} has {} slots left undistributed",
            s.block, s.center, s.remaining
        );
    }
    AllocationOutcome {
        assignments,
        failures,
        exhausted_centers,
        summary,
    }
}

/// Drives a single request to a terminal state: `Assigned` or `Failed`.
fn run_request(
    request: &DonationRequest,
    inventory: &mut Inventory,
    exhausted_centers: &mut Vec<String>,
) -> RequestState {
    let preferences = [&request.first_preference, &request.second_preference];
    let mut state = RequestState::Unassigned;
    loop {
        state = match state {
            RequestState::Unassigned => try_preference(0, preferences[0], inventory),
            // A donor naming the same center twice only gets one attempt at it.
            RequestState::PreferenceExhausted(0) if request.has_duplicate_preference() => {
                note_exhausted(preferences[0], inventory, exhausted_centers);
                RequestState::Failed(ErrorCode::DuplicatePreference)
            }
            RequestState::PreferenceExhausted(0) => {
                note_exhausted(preferences[0], inventory, exhausted_centers);
                match try_preference(1, preferences[1], inventory) {
                    RequestState::Assigned { center, block, row } => {
                        info!(
                            "Donor {} phone {} got their second choice of sector: {}",
                            request.name, request.phone, center
                        );
                        RequestState::Assigned { center, block, row }
                    }
                    other => other,
                }
            }
            RequestState::PreferenceExhausted(_) => {
                note_exhausted(preferences[1], inventory, exhausted_centers);
                RequestState::Failed(ErrorCode::BothSectorsExhausted)
            }
            terminal => return terminal,
        };
    }
}

fn try_preference(position: usize, center: &str, inventory: &mut Inventory) -> RequestState {
    if inventory.center(center).is_none() {
        warn!("Sector {:?} is not a configured collection center", center);
    }
    match inventory.claim(center) {
        Some((block, row)) => RequestState::Assigned {
            center: center.to_string(),
            block,
            row,
        },
        None => RequestState::PreferenceExhausted(position),
    }
}

/// Flags the center as exhausted, notifying only the first time.
fn note_exhausted(center: &str, inventory: &mut Inventory, exhausted_centers: &mut Vec<String>) {
    if let Some(c) = inventory.center_mut(center) {
        if !c.exhausted {
            c.exhausted = true;
            exhausted_centers.push(c.name.clone());
            info!("Sector {} has handed out all its census", c.name);
        }
    }
}

/// Writes the owner details of every assignment in the two rows following its separator.
pub fn write_assignments(
    grid: &mut dyn CellGrid,
    owner_column: Column,
    assignments: &[SlotAssignment],
) -> Result<(), DistributionErrors> {
    for a in assignments.iter() {
        grid.set(&a.block, a.row + 1, owner_column, CellValue::from(a.name.as_str()))?;
        grid.set(&a.block, a.row + 2, owner_column, CellValue::from(a.phone.as_str()))?;
    }
    debug!("write_assignments: {} slots written", assignments.len());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::MemoryGrid;
    use crate::inventory::{CensusBlock, CollectionCenter};

    fn center(name: &str, blocks: &[(&str, Vec<u32>)]) -> CollectionCenter {
        CollectionCenter {
            name: name.to_string(),
            blocks: blocks
                .iter()
                .map(|(b, rows)| CensusBlock::new(b, rows.clone()))
                .collect(),
            exhausted: false,
        }
    }

    fn request(name: &str, p1: &str, p2: &str, quantity: u32) -> DonationRequest {
        DonationRequest {
            name: name.to_string(),
            phone: format!("{}-phone", name),
            first_preference: p1.to_string(),
            second_preference: p2.to_string(),
            quantity,
            survey_row: 2,
        }
    }

    #[test]
    fn basic_allocation() {
        let _ = env_logger::builder().is_test(true).try_init();
        let mut inv = Inventory {
            centers: vec![
                center("A", &[("A1", vec![10])]),
                center("B", &[("B1", vec![4, 8])]),
            ],
        };
        let mut ana = request("Ana", "A", "B", 2);
        ana.phone = "555-1111".to_string();
        let outcome = allocate(&[ana.clone(), ana], &mut inv);

        assert!(outcome.failures.is_empty());
        let placed: Vec<(&str, u32)> = outcome
            .assignments
            .iter()
            .map(|a| (a.block.as_str(), a.row))
            .collect();
        assert_eq!(placed, vec![("A1", 10), ("B1", 4)]);
        assert_eq!(outcome.exhausted_centers, vec!["A".to_string()]);
        assert!(inv.center("A").unwrap().exhausted);
        assert!(!inv.center("B").unwrap().exhausted);
        assert_eq!(outcome.summary[1].remaining, 1);

        let mut g = MemoryGrid::new();
        g.add_sheet("A1");
        g.add_sheet("B1");
        write_assignments(&mut g, Column(1), &outcome.assignments).unwrap();
        assert_eq!(g.get("A1", 11, Column(1)), CellValue::from("Ana"));
        assert_eq!(g.get("A1", 12, Column(1)), CellValue::from("555-1111"));
        assert_eq!(g.get("B1", 5, Column(1)), CellValue::from("Ana"));
        assert_eq!(g.get("B1", 6, Column(1)), CellValue::from("555-1111"));
        assert_eq!(g.get("A1", 10, Column(1)), CellValue::Empty);
    }

    #[test]
    fn blocks_tried_in_order() {
        let mut inv = Inventory {
            centers: vec![center("Santa Ana", &[("LIA", vec![]), ("QUI", vec![3]), ("CPN", vec![1])])],
        };
        let outcome = allocate(
            &[request("a", "Santa Ana", "Santa Ana", 1), request("b", "Santa Ana", "Santa Ana", 1)],
            &mut inv,
        );
        let blocks: Vec<&str> = outcome.assignments.iter().map(|a| a.block.as_str()).collect();
        assert_eq!(blocks, vec!["QUI", "CPN"]);
        assert!(outcome.exhausted_centers.is_empty());
    }

    #[test]
    fn duplicate_preference() {
        let mut inv = Inventory {
            centers: vec![center("CenterA", &[("A1", vec![])]), center("B", &[("B1", vec![2])])],
        };
        let outcome = allocate(&[request("Eva", "CenterA", "CenterA", 1)], &mut inv);
        assert!(outcome.assignments.is_empty());
        assert_eq!(outcome.failures.len(), 1);
        assert_eq!(outcome.failures[0].code, ErrorCode::DuplicatePreference);
        assert_eq!(outcome.failures[0].name, "Eva");
        // The other center is untouched.
        assert_eq!(inv.free_slot_count(), 1);
    }

    #[test]
    fn duplicate_preference_with_room() {
        let mut inv = Inventory {
            centers: vec![center("CenterA", &[("A1", vec![5])])],
        };
        let outcome = allocate(&[request("Eva", "CenterA", "CenterA", 1)], &mut inv);
        assert_eq!(outcome.assignments.len(), 1);
        assert!(outcome.failures.is_empty());
    }

    #[test]
    fn both_sectors_exhausted() {
        let mut inv = Inventory {
            centers: vec![center("A", &[("A1", vec![])]), center("B", &[("B1", vec![]), ("B2", vec![])])],
        };
        let outcome = allocate(&[request("Luis", "A", "B", 1)], &mut inv);
        assert!(outcome.assignments.is_empty());
        assert_eq!(outcome.failures.len(), 1);
        assert_eq!(outcome.failures[0].code, ErrorCode::BothSectorsExhausted);
        assert_eq!(outcome.exhausted_centers, vec!["A".to_string(), "B".to_string()]);
    }

    #[test]
    fn exhaustion_notified_once() {
        let mut inv = Inventory {
            centers: vec![center("A", &[("A1", vec![])]), center("B", &[("B1", vec![1, 4, 7])])],
        };
        let reqs = vec![request("a", "A", "B", 1), request("b", "A", "B", 1), request("c", "A", "B", 1)];
        let outcome = allocate(&reqs, &mut inv);
        assert_eq!(outcome.assignments.len(), 3);
        assert_eq!(outcome.exhausted_centers, vec!["A".to_string()]);
    }

    #[test]
    fn unknown_center_never_serves() {
        let mut inv = Inventory {
            centers: vec![center("A", &[("A1", vec![1])])],
        };
        let outcome = allocate(
            &[request("a", "Nowhere", "A", 1), request("b", "Nowhere", "Elsewhere", 1)],
            &mut inv,
        );
        assert_eq!(outcome.assignments.len(), 1);
        assert_eq!(outcome.assignments[0].center, "A");
        assert_eq!(outcome.failures.len(), 1);
        assert_eq!(outcome.failures[0].code, ErrorCode::BothSectorsExhausted);
        assert!(outcome.exhausted_centers.is_empty());
    }

    #[test]
    fn failures_keep_their_order_and_slots_are_conserved() {
        let mut inv = Inventory {
            centers: vec![center("A", &[("A1", vec![1, 4])]), center("B", &[("B1", vec![1])])],
        };
        let reqs = vec![
            request("r1", "A", "B", 1),
            request("r2", "B", "B", 1),
            request("r3", "B", "B", 1),
            request("r4", "A", "A", 1),
            request("r5", "B", "A", 1),
        ];
        let outcome = allocate(&reqs, &mut inv);
        let failed: Vec<&str> = outcome.failures.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(failed, vec!["r3", "r5"]);
        assert_eq!(outcome.failures[0].code, ErrorCode::DuplicatePreference);
        assert_eq!(outcome.failures[1].code, ErrorCode::BothSectorsExhausted);
        for s in outcome.summary.iter() {
            let assigned = outcome
                .assignments
                .iter()
                .filter(|a| a.block == s.block)
                .count();
            assert_eq!(s.initial_free, assigned + s.remaining);
        }
        let mut slots: Vec<(String, u32)> = outcome
            .assignments
            .iter()
            .map(|a| (a.block.clone(), a.row))
            .collect();
        slots.sort();
        slots.dedup();
        assert_eq!(slots.len(), outcome.assignments.len());
    }
}
