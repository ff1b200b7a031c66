// Layoutkeys Uchr Decoder
// Reads 'uchr' (UCKeyboardLayout) resources, including chained dead keys

use std::sync::Arc;

use crate::key::{KeyId, KeySequence};
use crate::layout::resource::{unichar_to_key_id, DeadKeyState, KeyResource, Translation};

/// Keyboard type used when the host does not report one (ANSI)
pub const DEFAULT_KEYBOARD_TYPE: u32 = 40;

/// Format words of the resource and its sub-tables
pub mod format {
    pub const HEADER: u16 = 0x1002;
    pub const MODIFIERS_TO_TABLE: u16 = 0x3001;
    pub const CHAR_TABLE_INDEX: u16 = 0x4001;
    pub const STATE_RECORDS_INDEX: u16 = 0x5001;
    pub const STATE_TERMINATORS: u16 = 0x6001;
    pub const SEQUENCE_DATA_INDEX: u16 = 0x7001;

    pub const ENTRY_TERMINAL: u16 = 0x0001;
    pub const ENTRY_RANGE: u16 = 0x0002;
}

/// Bits of an output word
pub mod output {
    pub const TEST_FOR_INDEX: u16 = 0xC000;
    pub const STATE_INDEX: u16 = 0x4000;
    pub const SEQUENCE_INDEX: u16 = 0x8000;
    pub const INDEX_MASK: u16 = 0x3FFF;
    pub const NONE: u16 = 0xFFFE;
    pub const INVALID: u16 = 0xFFFF;
}

/// Modifier combinations enumerated per resource. Only the low five
/// modifier bits matter; right-hand variants are ignored.
const MODIFIER_COMBINATIONS: u32 = 32;

const LAYOUT_HEADER_SIZE: usize = 12;
const KEYBOARD_TYPE_HEADER_SIZE: usize = 28;
const STATE_RECORD_HEADER_SIZE: usize = 8;

/// Reasons a layout resource is rejected
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LayoutError {
    #[error("layout data truncated: {needed} bytes needed at offset {offset}, {len} available")]
    Truncated {
        offset: usize,
        needed: usize,
        len: usize,
    },

    #[error("bad {table} format: expected {expected:#06x}, found {found:#06x}")]
    BadFormat {
        table: &'static str,
        expected: u16,
        found: u16,
    },

    #[error("no layout for keyboard type {0}")]
    NoKeyboardType(u32),

    #[error("default table {default} out of range ({count} tables)")]
    BadDefaultTable { default: u16, count: u32 },
}

/// What to do when a pending state has no entry in a state record
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Miss {
    /// Emit the terminator, then process the record as if idle
    Reprocess,
    /// Emit the terminator and stop
    Terminate,
}

#[derive(Debug, Clone)]
struct SequenceIndex {
    offset: usize,
    count: u16,
}

#[derive(Debug, Clone)]
struct Terminators {
    offset: usize,
    count: u16,
}

/// Validated locations of the sub-tables for one keyboard type
#[derive(Debug, Clone)]
struct Tables {
    modifiers_offset: usize,
    modifiers_count: u32,
    default_table: u16,
    table_size: u16,
    char_tables: Vec<usize>,
    /// Record offsets; `None` marks a record that does not fit the blob
    state_records: Vec<Option<usize>>,
    terminators: Option<Terminators>,
    sequences: Option<SequenceIndex>,
    /// State record of the unmodified space bar, used to spell out dead keys
    space_record: Option<u16>,
}

/// A `KeyResource` over one `uchr` blob.
///
/// Construction never fails: malformed data yields a resource that reports
/// `is_valid() == false` and answers every query with nothing.
#[derive(Debug, Clone)]
pub struct UchrKeyResource {
    data: Arc<[u8]>,
    tables: Option<Tables>,
}

fn read_u8(data: &[u8], offset: usize) -> Option<u8> {
    data.get(offset).copied()
}

fn read_u16(data: &[u8], offset: usize) -> Option<u16> {
    let bytes = data.get(offset..offset.checked_add(2)?)?;
    Some(u16::from_le_bytes([bytes[0], bytes[1]]))
}

fn read_u32(data: &[u8], offset: usize) -> Option<u32> {
    let bytes = data.get(offset..offset.checked_add(4)?)?;
    Some(u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
}

fn require(data: &[u8], offset: usize, needed: usize) -> Result<(), LayoutError> {
    match offset.checked_add(needed) {
        Some(end) if end <= data.len() => Ok(()),
        _ => Err(LayoutError::Truncated {
            offset,
            needed,
            len: data.len(),
        }),
    }
}

fn check_format(
    data: &[u8],
    offset: usize,
    table: &'static str,
    expected: u16,
) -> Result<(), LayoutError> {
    require(data, offset, 2)?;
    let found = read_u16(data, offset).unwrap_or_default();
    if found != expected {
        return Err(LayoutError::BadFormat {
            table,
            expected,
            found,
        });
    }
    Ok(())
}

impl UchrKeyResource {
    /// Decode a resource, degrading to an invalid resource on bad data
    pub fn new(data: impl Into<Arc<[u8]>>, keyboard_type: u32) -> Self {
        let data = data.into();
        match Self::locate(&data, keyboard_type) {
            Ok(tables) => Self {
                data,
                tables: Some(tables),
            },
            Err(e) => {
                log::warn!("ignoring keyboard layout resource: {}", e);
                Self { data, tables: None }
            }
        }
    }

    /// Decode a resource, reporting why it is unusable
    pub fn parse(data: impl Into<Arc<[u8]>>, keyboard_type: u32) -> Result<Self, LayoutError> {
        let data = data.into();
        let tables = Self::locate(&data, keyboard_type)?;
        Ok(Self {
            data,
            tables: Some(tables),
        })
    }

    /// Raw resource bytes
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    fn locate(data: &[u8], keyboard_type: u32) -> Result<Tables, LayoutError> {
        check_format(data, 0, "layout header", format::HEADER)?;
        require(data, 0, LAYOUT_HEADER_SIZE)?;
        let type_count = read_u32(data, 8).unwrap_or_default() as usize;
        require(
            data,
            LAYOUT_HEADER_SIZE,
            type_count.saturating_mul(KEYBOARD_TYPE_HEADER_SIZE),
        )?;

        // an exact keyboard type match wins, otherwise the default entry
        let mut header = None;
        for i in 0..type_count {
            let offset = LAYOUT_HEADER_SIZE + i * KEYBOARD_TYPE_HEADER_SIZE;
            let first = read_u32(data, offset).unwrap_or_default();
            let last = read_u32(data, offset + 4).unwrap_or_default();
            if keyboard_type >= first && keyboard_type <= last {
                header = Some(offset);
                break;
            }
            if first == 0 {
                header = Some(offset);
            }
        }
        let header = header.ok_or(LayoutError::NoKeyboardType(keyboard_type))?;
        let field = |n: usize| read_u32(data, header + 8 + n * 4).unwrap_or_default() as usize;
        let modifiers_offset = field(0);
        let char_index_offset = field(1);
        let records_offset = field(2);
        let terminators_offset = field(3);
        let sequences_offset = field(4);

        // modifiers to table number
        check_format(
            data,
            modifiers_offset,
            "modifiers table",
            format::MODIFIERS_TO_TABLE,
        )?;
        require(data, modifiers_offset, 8)?;
        let default_table = read_u16(data, modifiers_offset + 2).unwrap_or_default();
        let modifiers_count = read_u32(data, modifiers_offset + 4).unwrap_or_default();
        require(data, modifiers_offset + 8, modifiers_count as usize)?;

        // character tables
        check_format(
            data,
            char_index_offset,
            "character table index",
            format::CHAR_TABLE_INDEX,
        )?;
        require(data, char_index_offset, 8)?;
        let table_size = read_u16(data, char_index_offset + 2).unwrap_or_default();
        let table_count = read_u32(data, char_index_offset + 4).unwrap_or_default();
        require(
            data,
            char_index_offset + 8,
            (table_count as usize).saturating_mul(4),
        )?;
        let mut char_tables = Vec::with_capacity(table_count as usize);
        for i in 0..table_count as usize {
            let offset = read_u32(data, char_index_offset + 8 + i * 4).unwrap_or_default() as usize;
            require(data, offset, usize::from(table_size) * 2)?;
            char_tables.push(offset);
        }
        if u32::from(default_table) >= table_count {
            return Err(LayoutError::BadDefaultTable {
                default: default_table,
                count: table_count,
            });
        }

        let state_records = if records_offset != 0 {
            check_format(
                data,
                records_offset,
                "state records index",
                format::STATE_RECORDS_INDEX,
            )?;
            require(data, records_offset, 4)?;
            let count = read_u16(data, records_offset + 2).unwrap_or_default() as usize;
            require(data, records_offset + 4, count * 4)?;
            (0..count)
                .map(|i| {
                    let offset = read_u32(data, records_offset + 4 + i * 4)? as usize;
                    Self::record_fits(data, offset).then_some(offset)
                })
                .collect()
        } else {
            Vec::new()
        };

        let terminators = if terminators_offset != 0 {
            check_format(
                data,
                terminators_offset,
                "state terminators",
                format::STATE_TERMINATORS,
            )?;
            require(data, terminators_offset, 4)?;
            let count = read_u16(data, terminators_offset + 2).unwrap_or_default();
            require(data, terminators_offset + 4, usize::from(count) * 2)?;
            Some(Terminators {
                offset: terminators_offset + 4,
                count,
            })
        } else {
            None
        };

        let sequences = if sequences_offset != 0 {
            check_format(
                data,
                sequences_offset,
                "sequence data index",
                format::SEQUENCE_DATA_INDEX,
            )?;
            require(data, sequences_offset, 4)?;
            let count = read_u16(data, sequences_offset + 2).unwrap_or_default();
            require(data, sequences_offset + 4, (usize::from(count) + 1) * 2)?;
            Some(SequenceIndex {
                offset: sequences_offset,
                count,
            })
        } else {
            None
        };

        let mut tables = Tables {
            modifiers_offset,
            modifiers_count,
            default_table,
            table_size,
            char_tables,
            state_records,
            terminators,
            sequences,
            space_record: None,
        };
        tables.space_record = Self::find_space_record(data, &tables);
        Ok(tables)
    }

    fn record_fits(data: &[u8], offset: usize) -> bool {
        let Some(count) = read_u16(data, offset + 4) else {
            return false;
        };
        let entry_size = match read_u16(data, offset + 6) {
            Some(format::ENTRY_RANGE) => 8,
            _ => 4,
        };
        require(
            data,
            offset,
            STATE_RECORD_HEADER_SIZE + usize::from(count) * entry_size,
        )
        .is_ok()
    }

    /// The space bar lets a dead key be spelled out: dead key followed by
    /// space yields the accent on its own. Only a space bar that takes part
    /// in dead-key processing (one backed by a state record) is useful.
    fn find_space_record(data: &[u8], tables: &Tables) -> Option<u16> {
        let table = Self::table_for(data, tables, 0);
        (0..tables.table_size).find_map(|button| {
            let c = Self::cell(data, tables, table, u32::from(button))?;
            if c & output::TEST_FOR_INDEX != output::STATE_INDEX {
                return None;
            }
            let index = c & output::INDEX_MASK;
            let mut keys = KeySequence::new();
            let next = Self::process_record(data, tables, &mut keys, index, 0, Miss::Terminate)?;
            (next == 0 && keys.as_slice() == [KeyId::from(' ')]).then_some(index)
        })
    }

    fn table_for(data: &[u8], tables: &Tables, index: u32) -> u32 {
        if index >= tables.modifiers_count {
            return u32::from(tables.default_table);
        }
        match read_u8(data, tables.modifiers_offset + 8 + index as usize) {
            Some(table) if (table as usize) < tables.char_tables.len() => u32::from(table),
            _ => {
                log::trace!("modifier combination {} names a missing table", index);
                u32::from(tables.default_table)
            }
        }
    }

    fn cell(data: &[u8], tables: &Tables, table: u32, button: u32) -> Option<u16> {
        let base = *tables.char_tables.get(table as usize)?;
        if button >= u32::from(tables.table_size) {
            return None;
        }
        read_u16(data, base + button as usize * 2)
    }

    /// Append the output of one character-sequence word
    fn add_sequence(data: &[u8], tables: &Tables, keys: &mut KeySequence, c: u16) -> bool {
        if c & output::TEST_FOR_INDEX == output::SEQUENCE_INDEX {
            let index = c & output::INDEX_MASK;
            if let Some(sequences) = tables.sequences.as_ref().filter(|s| index < s.count) {
                let slot = sequences.offset + 4 + usize::from(index) * 2;
                let (Some(start), Some(end)) = (read_u16(data, slot), read_u16(data, slot + 2))
                else {
                    return false;
                };
                if start > end {
                    return false;
                }
                let units: Option<Vec<u16>> = (start..end)
                    .step_by(2)
                    .map(|at| read_u16(data, sequences.offset + usize::from(at)))
                    .collect();
                let Some(units) = units else {
                    return false;
                };
                for decoded in char::decode_utf16(units) {
                    let Ok(ch) = decoded else {
                        continue;
                    };
                    let id = match u16::try_from(u32::from(ch)) {
                        Ok(unit) => unichar_to_key_id(unit),
                        Err(_) => Some(KeyId::from(ch)),
                    };
                    keys.extend(id);
                }
                return true;
            }
            // an index past the sequence table is an ordinary character
        }

        if c != output::NONE {
            keys.extend(unichar_to_key_id(c));
        }
        true
    }

    fn add_terminator(data: &[u8], tables: &Tables, keys: &mut KeySequence, state: u16) -> bool {
        match &tables.terminators {
            Some(t) if state >= 1 && state <= t.count => {
                match read_u16(data, t.offset + usize::from(state - 1) * 2) {
                    Some(c) => Self::add_sequence(data, tables, keys, c),
                    None => false,
                }
            }
            _ => true,
        }
    }

    /// Feed one state record with the current state, returning the next
    /// state. `None` means the record is structurally unusable.
    fn process_record(
        data: &[u8],
        tables: &Tables,
        keys: &mut KeySequence,
        index: u16,
        state: u16,
        miss: Miss,
    ) -> Option<u16> {
        let record = (*tables.state_records.get(usize::from(index))?)?;
        let zero_output = read_u16(data, record)?;
        let zero_next = read_u16(data, record + 2)?;

        if state == 0 {
            return Self::add_sequence(data, tables, keys, zero_output).then_some(zero_next);
        }

        let entry_count = usize::from(read_u16(data, record + 4)?);
        let entries = record + STATE_RECORD_HEADER_SIZE;
        match read_u16(data, record + 6)? {
            format::ENTRY_TERMINAL => {
                for j in 0..entry_count {
                    let entry = entries + j * 4;
                    if read_u16(data, entry)? == state {
                        let c = read_u16(data, entry + 2)?;
                        return Self::add_sequence(data, tables, keys, c).then_some(0);
                    }
                }
            }
            format::ENTRY_RANGE => {
                for j in 0..entry_count {
                    let entry = entries + j * 8;
                    let start = read_u16(data, entry)?;
                    let range = u16::from(read_u8(data, entry + 2)?);
                    let delta = u16::from(read_u8(data, entry + 3)?);
                    if state < start || state - start > range {
                        continue;
                    }
                    let step = (state - start).wrapping_mul(delta);
                    let mut c = read_u16(data, entry + 4)?;
                    if c & output::TEST_FOR_INDEX == 0 {
                        c = c.wrapping_add(step);
                    }
                    let next = match read_u16(data, entry + 6)? {
                        0 => 0,
                        n => n.wrapping_add(step),
                    };
                    return Self::add_sequence(data, tables, keys, c).then_some(next);
                }
            }
            unknown => {
                log::trace!("state record {} has unknown entry format {:#06x}", index, unknown);
                return None;
            }
        }

        // no entry for this state: the pending dead key comes out on its own
        if !Self::add_terminator(data, tables, keys, state) {
            return None;
        }
        match miss {
            Miss::Terminate => Some(0),
            Miss::Reprocess => {
                Self::add_sequence(data, tables, keys, zero_output).then_some(zero_next)
            }
        }
    }

    /// Spell out the dead key in record `index` by following it with the
    /// space bar until the state machine settles.
    fn resolve_dead_key(data: &[u8], tables: &Tables, keys: &mut KeySequence, index: u16) -> bool {
        let Some(mut state) = Self::process_record(data, tables, keys, index, 0, Miss::Terminate)
        else {
            return false;
        };
        if state == 0 {
            // not a dead key
            return true;
        }

        let Some(space) = tables.space_record else {
            return false;
        };

        // a dead key must not have produced anything yet
        if !keys.is_empty() {
            return false;
        }

        // each step consumes one state record, so a chain can be no longer
        // than the table
        for _ in 0..tables.state_records.len() {
            match Self::process_record(data, tables, keys, space, state, Miss::Terminate) {
                Some(0) => {
                    for id in keys.iter_mut() {
                        *id = id.to_dead();
                    }
                    return true;
                }
                Some(next) => state = next,
                None => return false,
            }
        }
        log::trace!("dead key record {} did not terminate", index);
        false
    }

    fn debug_check_bounds(&self, tables: &Tables, table: u32, button: u32) {
        debug_assert!(
            (table as usize) < tables.char_tables.len(),
            "table {} out of range",
            table
        );
        debug_assert!(
            button < u32::from(tables.table_size),
            "button {} out of range",
            button
        );
    }
}

impl KeyResource for UchrKeyResource {
    fn is_valid(&self) -> bool {
        self.tables.is_some()
    }

    fn num_modifier_combinations(&self) -> u32 {
        if self.tables.is_some() {
            MODIFIER_COMBINATIONS
        } else {
            0
        }
    }

    fn num_tables(&self) -> u32 {
        self.tables
            .as_ref()
            .map_or(0, |t| t.char_tables.len() as u32)
    }

    fn num_buttons(&self) -> u32 {
        self.tables.as_ref().map_or(0, |t| u32::from(t.table_size))
    }

    fn table_for_modifier(&self, index: u32) -> u32 {
        self.tables
            .as_ref()
            .map_or(0, |t| Self::table_for(&self.data, t, index))
    }

    fn keys(&self, table: u32, button: u32) -> KeySequence {
        let mut keys = KeySequence::new();
        let Some(tables) = &self.tables else {
            return keys;
        };
        self.debug_check_bounds(tables, table, button);
        let Some(c) = Self::cell(&self.data, tables, table, button) else {
            return keys;
        };

        let ok = if c & output::TEST_FOR_INDEX == output::STATE_INDEX {
            Self::resolve_dead_key(&self.data, tables, &mut keys, c & output::INDEX_MASK)
        } else {
            Self::add_sequence(&self.data, tables, &mut keys, c)
        };
        if !ok {
            log::trace!("no output for table {} button {}", table, button);
            keys.clear();
        }
        keys
    }

    fn translate(&self, table: u32, button: u32, state: DeadKeyState) -> Translation {
        let Some(tables) = &self.tables else {
            return Translation::default();
        };
        self.debug_check_bounds(tables, table, button);
        let Some(c) = Self::cell(&self.data, tables, table, button) else {
            return Translation::default();
        };

        let mut keys = KeySequence::new();
        let next = if c & output::TEST_FOR_INDEX == output::STATE_INDEX {
            Self::process_record(
                &self.data,
                tables,
                &mut keys,
                c & output::INDEX_MASK,
                state.0,
                Miss::Reprocess,
            )
        } else {
            let terminated =
                !state.is_pending() || Self::add_terminator(&self.data, tables, &mut keys, state.0);
            (terminated && Self::add_sequence(&self.data, tables, &mut keys, c)).then_some(0)
        };

        match next {
            Some(next) => Translation {
                keys,
                state: DeadKeyState(next),
            },
            None => {
                log::trace!("dropping keystroke for table {} button {}", table, button);
                Translation::default()
            }
        }
    }
}
