// ********* Grid addressing ***********

use std::error::Error;
use std::fmt::Display;

/// A column of a sheet, 1-based (`A` is column 1).
#[derive(Eq, PartialEq, Debug, Clone, Copy, Hash, Ord, PartialOrd)]
pub struct Column(pub u32);

impl Column {
    /// Parses Excel-style column letters (`A`, `G`, `AB`). Case insensitive.
    pub fn from_letters(letters: &str) -> Option<Column> {
        if letters.is_empty() {
            return None;
        }
        let mut idx: u32 = 0;
        for c in letters.chars() {
            if !c.is_ascii_alphabetic() {
                return None;
            }
            let digit = (c.to_ascii_uppercase() as u32) - ('A' as u32) + 1;
            idx = idx.checked_mul(26)?.checked_add(digit)?;
        }
        Some(Column(idx))
    }

    pub fn letters(&self) -> String {
        let mut n = self.0;
        let mut res: Vec<char> = Vec::new();
        while n > 0 {
            let rem = (n - 1) % 26;
            res.push((b'A' + rem as u8) as char);
            n = (n - 1) / 26;
        }
        res.iter().rev().collect()
    }
}

/// A single cell location such as `A10`.
#[derive(Eq, PartialEq, Debug, Clone, Copy, Hash)]
pub struct CellRef {
    pub row: u32,
    pub column: Column,
}

impl CellRef {
    pub fn parse(s: &str) -> Option<CellRef> {
        let split = s.find(|c: char| c.is_ascii_digit())?;
        let column = Column::from_letters(&s[..split])?;
        let row = s[split..].parse::<u32>().ok()?;
        if row == 0 {
            return None;
        }
        Some(CellRef { row, column })
    }
}

impl Display for CellRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}{}", self.column.letters(), self.row)
    }
}

/// The content of a cell, as seen by the distribution.
#[derive(PartialEq, Debug, Clone)]
pub enum CellValue {
    Empty,
    Text(String),
    Number(f64),
}

impl CellValue {
    /// Empty cells and cells holding an empty string are both considered empty.
    pub fn is_empty(&self) -> bool {
        match self {
            CellValue::Empty => true,
            CellValue::Text(s) => s.is_empty(),
            CellValue::Number(_) => false,
        }
    }

    /// The text rendering of the cell. Integral numbers lose their fractional part,
    /// so that a phone number stored as a number reads back as `5551111`.
    pub fn to_text(&self) -> String {
        match self {
            CellValue::Empty => "".to_string(),
            CellValue::Text(s) => s.clone(),
            CellValue::Number(n) if n.fract() == 0.0 && n.abs() < 1e15 => format!("{}", *n as i64),
            CellValue::Number(n) => n.to_string(),
        }
    }

    /// Reads the cell as a whole number, from a numeric cell or from text.
    pub fn as_integer(&self) -> Option<i64> {
        match self {
            CellValue::Number(n) if n.fract() == 0.0 && n.abs() < 1e15 => Some(*n as i64),
            CellValue::Text(s) => s.trim().parse::<i64>().ok(),
            _ => None,
        }
    }

    /// True if the cell holds exactly the given marker symbol.
    pub fn is_marker(&self, symbol: &str) -> bool {
        match self {
            CellValue::Text(s) => s == symbol,
            _ => false,
        }
    }
}

impl From<&str> for CellValue {
    fn from(s: &str) -> Self {
        CellValue::Text(s.to_string())
    }
}

impl From<String> for CellValue {
    fn from(s: String) -> Self {
        CellValue::Text(s)
    }
}

impl From<u32> for CellValue {
    fn from(n: u32) -> Self {
        CellValue::Number(n as f64)
    }
}

// ********* Input data structures ***********

/// One unit (box) of a donor's pledge.
///
/// A survey row pledging `n` boxes produces `n` identical requests.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct DonationRequest {
    pub name: String,
    pub phone: String,
    pub first_preference: String,
    pub second_preference: String,
    /// Total number of boxes pledged on the survey row. Informational only.
    pub quantity: u32,
    /// The survey row this request was read from.
    pub survey_row: u32,
}

impl DonationRequest {
    pub fn has_duplicate_preference(&self) -> bool {
        self.first_preference == self.second_preference
    }
}

/// The requests read from the survey in one run.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct SurveyBatch {
    pub requests: Vec<DonationRequest>,
    /// Highest used row of the survey sheet when it was read.
    pub last_row: u32,
}

/// A collection center and its census blocks, in the order in which they are tried.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct CenterLayout {
    pub name: String,
    pub blocks: Vec<String>,
}

/// Where the survey fields live. The same columns are reused by the error ledger.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct ColumnLayout {
    /// Column of the census sheets holding the separator marks and the owner details.
    pub owner: Column,
    pub name: Column,
    pub phone: Column,
    pub quantity: Column,
    pub first_preference: Column,
    pub second_preference: Column,
    pub error: Column,
}

impl ColumnLayout {
    pub const DEFAULT_LAYOUT: ColumnLayout = ColumnLayout {
        owner: Column(1),
        name: Column(2),
        phone: Column(3),
        quantity: Column(4),
        first_preference: Column(5),
        second_preference: Column(6),
        error: Column(7),
    };
}

/// Location of the redundant checkpoint copies. The first cell is the primary copy.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct CheckpointLayout {
    pub sheet: String,
    pub cells: Vec<CellRef>,
}

/// Everything a run needs to know about the workbooks.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct DistributionSettings {
    pub survey_sheet: String,
    pub error_sheet: String,
    pub checkpoint: CheckpointLayout,
    pub columns: ColumnLayout,
    /// Marks the row preceding each census slot.
    pub separator: String,
    /// Stops the scan of a census sheet.
    pub terminator: String,
    pub centers: Vec<CenterLayout>,
}

// ******** Output data structures *********

#[derive(Eq, PartialEq, Debug, Clone, Copy, Hash)]
pub enum ErrorCode {
    /// The first sector had no room and the second one is the same sector.
    DuplicatePreference,
    /// Neither of the two sectors had room.
    BothSectorsExhausted,
}

impl ErrorCode {
    pub fn message(&self) -> &'static str {
        match self {
            ErrorCode::DuplicatePreference => {
                "No room left in the first distribution sector and the second sector is the same one"
            }
            ErrorCode::BothSectorsExhausted => {
                "No census could be assigned because both distribution sectors are full"
            }
        }
    }
}

/// A request that could not be matched with a census slot.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct ErrorRecord {
    pub name: String,
    pub phone: String,
    pub first_preference: String,
    pub second_preference: String,
    pub quantity: u32,
    pub code: ErrorCode,
}

impl ErrorRecord {
    pub fn new(request: &DonationRequest, code: ErrorCode) -> ErrorRecord {
        ErrorRecord {
            name: request.name.clone(),
            phone: request.phone.clone(),
            first_preference: request.first_preference.clone(),
            second_preference: request.second_preference.clone(),
            quantity: request.quantity,
            code,
        }
    }
}

/// A slot handed to a donor. The owner details go in the two rows after `row`.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct SlotAssignment {
    pub center: String,
    pub block: String,
    /// Row of the separator mark.
    pub row: u32,
    pub name: String,
    pub phone: String,
}

/// Occupancy of one census block after the allocation pass.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct BlockSummary {
    pub center: String,
    pub block: String,
    pub initial_free: usize,
    pub remaining: usize,
}

impl BlockSummary {
    pub fn assigned(&self) -> usize {
        self.initial_free - self.remaining
    }
}

#[derive(Eq, PartialEq, Debug, Clone)]
pub struct AllocationOutcome {
    pub assignments: Vec<SlotAssignment>,
    pub failures: Vec<ErrorRecord>,
    /// Centers that ran out of slots during the pass, in the order they ran out.
    pub exhausted_centers: Vec<String>,
    pub summary: Vec<BlockSummary>,
}

/// What a run did.
#[derive(Eq, PartialEq, Debug, Clone)]
pub enum RunReport {
    /// No survey rows past the checkpoint. Nothing was written.
    NothingToDo { checkpoint: u32 },
    Completed {
        previous_checkpoint: u32,
        checkpoint: u32,
        requests: usize,
        outcome: AllocationOutcome,
    },
}

/// Errors that prevent a run from completing. None of them leaves partial writes behind.
#[derive(PartialEq, Debug, Clone)]
pub enum DistributionErrors {
    /// The redundant checkpoint copies disagree (or one of them is unreadable).
    CorruptCheckpoint {
        sheet: String,
        values: Vec<(CellRef, CellValue)>,
    },
    /// A sheet the run depends on does not exist.
    MissingSheet { sheet: String },
    /// A configured census block has no sheet of that name.
    MissingBlock { center: String, block: String },
    /// The quantity of a survey row is not a positive integer, or is implausibly large.
    InvalidQuantity { row: u32, value: CellValue },
    /// A survey row has neither a name nor a phone to mark its census with.
    MissingDonorDetails { row: u32 },
    /// The backing store failed to read or write.
    Storage { message: String },
}

impl Error for DistributionErrors {}

impl Display for DistributionErrors {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DistributionErrors::CorruptCheckpoint { sheet, values } => {
                write!(f, "Corruption in sheet {}: checkpoint copies disagree:", sheet)?;
                for (cell, value) in values {
                    write!(f, " {}={:?}", cell, value)?;
                }
                Ok(())
            }
            DistributionErrors::MissingSheet { sheet } => {
                write!(f, "Sheet {} does not exist", sheet)
            }
            DistributionErrors::MissingBlock { center, block } => write!(
                f,
                "Census {} of center {} is not an existing sheet",
                block, center
            ),
            DistributionErrors::InvalidQuantity { row, value } => write!(
                f,
                "Survey row {}: quantity {:?} is not a positive integer of at most {}",
                row,
                value,
                crate::ingest::MAX_BOXES_PER_ROW
            ),
            DistributionErrors::MissingDonorDetails { row } => write!(
                f,
                "Survey row {}: the donor has neither a name nor a phone",
                row
            ),
            DistributionErrors::Storage { message } => write!(f, "Storage error: {}", message),
        }
    }
}
