use log::{debug, info};
use std::collections::VecDeque;

use crate::config::*;
use crate::grid::CellGrid;

/// A census sheet and the rows of its slots that still have no owner.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct CensusBlock {
    pub name: String,
    /// Separator rows of the free slots, top to bottom. Popped slots never come back.
    free_slots: VecDeque<u32>,
    initial_free: usize,
}

impl CensusBlock {
    pub fn new(name: &str, free_slots: Vec<u32>) -> CensusBlock {
        CensusBlock {
            name: name.to_string(),
            initial_free: free_slots.len(),
            free_slots: free_slots.into(),
        }
    }

    pub fn free_slots(&self) -> impl Iterator<Item = &u32> {
        self.free_slots.iter()
    }

    pub fn remaining(&self) -> usize {
        self.free_slots.len()
    }

    pub fn initial_free(&self) -> usize {
        self.initial_free
    }

    /// Takes the topmost free slot.
    pub fn claim(&mut self) -> Option<u32> {
        self.free_slots.pop_front()
    }
}

#[derive(Eq, PartialEq, Debug, Clone)]
pub struct CollectionCenter {
    pub name: String,
    pub blocks: Vec<CensusBlock>,
    /// Set the first time the center could not serve a request during this run.
    pub exhausted: bool,
}

impl CollectionCenter {
    /// Takes the first free slot of the first block that still has one.
    fn claim(&mut self) -> Option<(&str, u32)> {
        for block in self.blocks.iter_mut() {
            if let Some(row) = block.claim() {
                return Some((block.name.as_str(), row));
            }
            debug!("Center {}: no more slots in {}", self.name, block.name);
        }
        None
    }
}

/// The free slots of every census block, grouped by center in configuration order.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct Inventory {
    pub centers: Vec<CollectionCenter>,
}

impl Inventory {
    pub fn center(&self, name: &str) -> Option<&CollectionCenter> {
        self.centers.iter().find(|c| c.name == name)
    }

    pub fn center_mut(&mut self, name: &str) -> Option<&mut CollectionCenter> {
        self.centers.iter_mut().find(|c| c.name == name)
    }

    /// Claims a slot for the given center. `None` if the center is unknown or full.
    pub fn claim(&mut self, center: &str) -> Option<(String, u32)> {
        self.center_mut(center)
            .and_then(|c| c.claim())
            .map(|(block, row)| (block.to_string(), row))
    }

    pub fn free_slot_count(&self) -> usize {
        self.centers
            .iter()
            .flat_map(|c| c.blocks.iter())
            .map(|b| b.remaining())
            .sum()
    }

    pub fn summary(&self) -> Vec<BlockSummary> {
        let mut res: Vec<BlockSummary> = Vec::new();
        for center in self.centers.iter() {
            for block in center.blocks.iter() {
                res.push(BlockSummary {
                    center: center.name.clone(),
                    block: block.name.clone(),
                    initial_free: block.initial_free(),
                    remaining: block.remaining(),
                });
            }
        }
        res
    }
}

/// Scans the census sheets of every center for free slots.
///
/// Layout of a census sheet, in the owner column: a row holding the separator symbol
/// precedes each slot, and the two rows below it hold the owner's name and phone. A slot
/// whose two owner rows are both empty is free. A row holding the terminator symbol ends
/// the sheet: the slots below it are never handed out.
///
/// Every block is checked to exist before any sheet is scanned.
pub fn scan(
    grid: &dyn CellGrid,
    centers: &[CenterLayout],
    owner_column: Column,
    separator: &str,
    terminator: &str,
) -> Result<Inventory, DistributionErrors> {
    for center in centers.iter() {
        for block in center.blocks.iter() {
            if !grid.sheet_exists(block) {
                return Err(DistributionErrors::MissingBlock {
                    center: center.name.clone(),
                    block: block.clone(),
                });
            }
        }
    }

    let mut res: Vec<CollectionCenter> = Vec::new();
    for center in centers.iter() {
        debug!("scan: center {}", center.name);
        let mut blocks: Vec<CensusBlock> = Vec::new();
        for block in center.blocks.iter() {
            let free = scan_block(grid, block, owner_column, separator, terminator);
            info!(
                "Census {} of center {}: {} free slots",
                block,
                center.name,
                free.len()
            );
            blocks.push(CensusBlock::new(block, free));
        }
        res.push(CollectionCenter {
            name: center.name.clone(),
            blocks,
            exhausted: false,
        });
    }
    Ok(Inventory { centers: res })
}

fn scan_block(
    grid: &dyn CellGrid,
    sheet: &str,
    owner_column: Column,
    separator: &str,
    terminator: &str,
) -> Vec<u32> {
    let last_row = grid.highest_used_row(sheet);
    debug!("scan_block: sheet {} last_row {}", sheet, last_row);
    let mut free: Vec<u32> = Vec::new();
    for row in 1..=last_row {
        let mark = grid.get(sheet, row, owner_column);
        if mark.is_marker(terminator) {
            info!(
                "Found stop symbol {:?} in {} at row {}: the census below it will not be distributed",
                terminator, sheet, row
            );
            break;
        }
        if mark.is_marker(separator)
            && grid.get(sheet, row + 1, owner_column).is_empty()
            && grid.get(sheet, row + 2, owner_column).is_empty()
        {
            free.push(row);
        }
    }
    free
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::MemoryGrid;

    const OWNER: Column = Column(1);

    fn sheet(marks: &[&str]) -> Vec<Vec<CellValue>> {
        // The second column keeps every row in use, as family details would.
        marks
            .iter()
            .map(|m| vec![CellValue::from(*m), CellValue::from("family")])
            .collect()
    }

    fn layout(center: &str, blocks: &[&str]) -> CenterLayout {
        CenterLayout {
            name: center.to_string(),
            blocks: blocks.iter().map(|s| s.to_string()).collect(),
        }
    }

    #[test]
    fn finds_free_slots_top_to_bottom() {
        let g = MemoryGrid::new().with_rows(
            "DUL",
            &sheet(&["x", "", "", "x", "Ana", "555", "x", "", "", "x", "", ""]),
        );
        let inv = scan(&g, &[layout("Tres Rios", &["DUL"])], OWNER, "x", "yy").unwrap();
        let block = &inv.centers[0].blocks[0];
        assert_eq!(block.free_slots().cloned().collect::<Vec<u32>>(), vec![1, 7, 10]);
        assert_eq!(block.initial_free(), 3);
    }

    #[test]
    fn half_filled_slot_is_taken() {
        let g = MemoryGrid::new().with_rows("DUL", &sheet(&["x", "", "555", "x", "Ana", ""]));
        let inv = scan(&g, &[layout("Tres Rios", &["DUL"])], OWNER, "x", "yy").unwrap();
        assert_eq!(inv.free_slot_count(), 0);
    }

    #[test]
    fn slot_at_end_of_sheet_is_free() {
        // Nothing is written below the last separator.
        let g = MemoryGrid::new().with_rows("DUL", &[vec![CellValue::from("x")]]);
        let inv = scan(&g, &[layout("Tres Rios", &["DUL"])], OWNER, "x", "yy").unwrap();
        assert_eq!(
            inv.centers[0].blocks[0].free_slots().cloned().collect::<Vec<u32>>(),
            vec![1]
        );
    }

    #[test]
    fn terminator_stops_the_scan() {
        let g = MemoryGrid::new().with_rows(
            "DUL",
            &sheet(&["x", "", "", "yy", "x", "", "", "x", "", ""]),
        );
        let inv = scan(&g, &[layout("Tres Rios", &["DUL"])], OWNER, "x", "yy").unwrap();
        assert_eq!(
            inv.centers[0].blocks[0].free_slots().cloned().collect::<Vec<u32>>(),
            vec![1]
        );
    }

    #[test]
    fn custom_symbols() {
        let g = MemoryGrid::new().with_rows("DUL", &sheet(&["#", "", "", "x", "", "", "END"]));
        let inv = scan(&g, &[layout("Tres Rios", &["DUL"])], OWNER, "#", "END").unwrap();
        assert_eq!(
            inv.centers[0].blocks[0].free_slots().cloned().collect::<Vec<u32>>(),
            vec![1]
        );
    }

    #[test]
    fn missing_block_fails_before_scanning() {
        let g = MemoryGrid::new().with_rows("DUL", &sheet(&["x", "", ""]));
        let res = scan(
            &g,
            &[layout("Tres Rios", &["DUL"]), layout("Escazu", &["PUR", "CRP"])],
            OWNER,
            "x",
            "yy",
        );
        assert_eq!(
            res,
            Err(DistributionErrors::MissingBlock {
                center: "Escazu".to_string(),
                block: "PUR".to_string()
            })
        );
    }

    #[test]
    fn claims_across_blocks_in_order() {
        let g = MemoryGrid::new()
            .with_rows("LIA", &sheet(&["x", "", ""]))
            .with_rows("QUI", &sheet(&["x", "", "", "x", "", ""]));
        let mut inv = scan(&g, &[layout("Santa Ana", &["LIA", "QUI"])], OWNER, "x", "yy").unwrap();
        assert_eq!(inv.claim("Santa Ana"), Some(("LIA".to_string(), 1)));
        assert_eq!(inv.claim("Santa Ana"), Some(("QUI".to_string(), 1)));
        assert_eq!(inv.claim("Santa Ana"), Some(("QUI".to_string(), 4)));
        assert_eq!(inv.claim("Santa Ana"), None);
        assert_eq!(inv.claim("Nowhere"), None);
        let summary = inv.summary();
        assert_eq!(summary.len(), 2);
        assert_eq!(summary[1].initial_free, 2);
        assert_eq!(summary[1].remaining, 0);
        assert_eq!(summary[1].assigned(), 2);
    }
}
