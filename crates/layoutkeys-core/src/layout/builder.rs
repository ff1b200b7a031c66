// Layoutkeys Uchr Builder
// Writes well-formed 'uchr' blobs from a declarative description

use crate::layout::uchr::{format, output};

/// Entries of one state record
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StateEntries {
    /// `(state, output)` pairs; a match always returns to the idle state
    Terminal(Vec<(u16, u16)>),
    /// `(start, range, delta, output, next_state)` tuples
    Range(Vec<(u16, u8, u8, u16, u16)>),
}

/// One dead-key state record
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StateRecord {
    pub zero_output: u16,
    pub zero_next: u16,
    pub entries: StateEntries,
}

impl StateRecord {
    /// A record that types `c` when idle
    pub fn new(c: char, entries: StateEntries) -> Self {
        Self {
            zero_output: bmp_unit(c),
            zero_next: 0,
            entries,
        }
    }

    /// A dead key: no output when idle, moves to `state`
    pub fn dead(state: u16) -> Self {
        Self {
            zero_output: output::NONE,
            zero_next: state,
            entries: StateEntries::Terminal(Vec::new()),
        }
    }

    /// A record with raw output words
    pub fn raw(zero_output: u16, zero_next: u16, entries: StateEntries) -> Self {
        Self {
            zero_output,
            zero_next,
            entries,
        }
    }
}

fn bmp_unit(c: char) -> u16 {
    u16::try_from(u32::from(c)).unwrap_or(output::INVALID)
}

/// Builder for `uchr` layout blobs with a single keyboard-type header.
///
/// ```
/// use layoutkeys_core::layout::UchrBuilder;
///
/// let mut builder = UchrBuilder::new(4);
/// let plain = builder.add_table();
/// builder.set_char(plain, 0, 'a');
/// let blob = builder.build();
/// assert_eq!(&blob[..2], &[0x02, 0x10]);
/// ```
#[derive(Debug, Clone)]
pub struct UchrBuilder {
    buttons: u16,
    keyboard_types: (u32, u32),
    default_table: u32,
    modifiers: Vec<Option<u32>>,
    tables: Vec<Vec<u16>>,
    records: Vec<StateRecord>,
    terminators: Vec<u16>,
    sequences: Vec<Vec<u16>>,
}

impl UchrBuilder {
    /// Start a layout whose tables have `buttons` cells each
    pub fn new(buttons: u16) -> Self {
        Self {
            buttons,
            keyboard_types: (0, 0),
            default_table: 0,
            modifiers: Vec::new(),
            tables: Vec::new(),
            records: Vec::new(),
            terminators: Vec::new(),
            sequences: Vec::new(),
        }
    }

    /// Restrict the layout to a range of keyboard types
    pub fn set_keyboard_types(&mut self, first: u32, last: u32) -> &mut Self {
        self.keyboard_types = (first, last);
        self
    }

    /// Table used by modifier combinations without an explicit mapping,
    /// whether set before or after them
    pub fn set_default_table(&mut self, table: u32) -> &mut Self {
        self.default_table = table;
        self
    }

    /// Add an output table with every cell empty, returning its index
    pub fn add_table(&mut self) -> u32 {
        self.tables
            .push(vec![output::NONE; usize::from(self.buttons)]);
        self.tables.len() as u32 - 1
    }

    /// Route a modifier-combination index to a table
    pub fn map_modifier(&mut self, index: u32, table: u32) -> &mut Self {
        let index = index as usize;
        if self.modifiers.len() <= index {
            self.modifiers.resize(index + 1, None);
        }
        self.modifiers[index] = Some(table);
        self
    }

    /// Set a raw output word
    pub fn set_output(&mut self, table: u32, button: u32, word: u16) -> &mut Self {
        self.tables[table as usize][button as usize] = word;
        self
    }

    /// Make a cell type `c`, spilling into a sequence outside the BMP
    pub fn set_char(&mut self, table: u32, button: u32, c: char) -> &mut Self {
        let word = self.char_output(c);
        self.set_output(table, button, word)
    }

    /// Make a cell run through a state record
    pub fn set_state(&mut self, table: u32, button: u32, record: u16) -> &mut Self {
        self.set_output(table, button, output::STATE_INDEX | record)
    }

    /// Add a state record, returning its index
    pub fn add_state_record(&mut self, record: StateRecord) -> u16 {
        self.records.push(record);
        self.records.len() as u16 - 1
    }

    /// Add a terminator, returning the dead-key state it terminates
    pub fn add_terminator(&mut self, c: char) -> u16 {
        let word = self.char_output(c);
        self.terminators.push(word);
        self.terminators.len() as u16
    }

    /// Add a multi-unit output, returning its output word
    pub fn add_sequence(&mut self, s: &str) -> u16 {
        self.sequences.push(s.encode_utf16().collect());
        output::SEQUENCE_INDEX | (self.sequences.len() as u16 - 1)
    }

    fn char_output(&mut self, c: char) -> u16 {
        match u16::try_from(u32::from(c)) {
            Ok(unit) => unit,
            Err(_) => self.add_sequence(c.encode_utf8(&mut [0; 4])),
        }
    }

    /// Serialize the layout
    pub fn build(&self) -> Vec<u8> {
        let mut w = Writer::default();

        w.u16(format::HEADER);
        w.u16(0);
        w.u32(0);
        w.u32(1);
        let header = w.len();
        w.u32(self.keyboard_types.0);
        w.u32(self.keyboard_types.1);
        for _ in 0..5 {
            w.u32(0);
        }

        w.align();
        w.patch_u32(header + 8, w.len());
        w.u16(format::MODIFIERS_TO_TABLE);
        w.u16(self.default_table as u16);
        w.u32(self.modifiers.len() as u32);
        for table in &self.modifiers {
            w.u8(table.unwrap_or(self.default_table) as u8);
        }

        w.align();
        let char_index = w.len();
        w.patch_u32(header + 12, char_index);
        w.u16(format::CHAR_TABLE_INDEX);
        w.u16(self.buttons);
        w.u32(self.tables.len() as u32);
        let slots = w.reserve_u32(self.tables.len());
        for (i, table) in self.tables.iter().enumerate() {
            w.align();
            w.patch_u32(slots + i * 4, w.len());
            for &cell in table {
                w.u16(cell);
            }
        }

        if !self.records.is_empty() {
            w.align();
            w.patch_u32(header + 16, w.len());
            w.u16(format::STATE_RECORDS_INDEX);
            w.u16(self.records.len() as u16);
            let slots = w.reserve_u32(self.records.len());
            for (i, record) in self.records.iter().enumerate() {
                w.align();
                w.patch_u32(slots + i * 4, w.len());
                w.u16(record.zero_output);
                w.u16(record.zero_next);
                match &record.entries {
                    StateEntries::Terminal(entries) => {
                        w.u16(entries.len() as u16);
                        w.u16(format::ENTRY_TERMINAL);
                        for &(state, out) in entries {
                            w.u16(state);
                            w.u16(out);
                        }
                    }
                    StateEntries::Range(entries) => {
                        w.u16(entries.len() as u16);
                        w.u16(format::ENTRY_RANGE);
                        for &(start, range, delta, out, next) in entries {
                            w.u16(start);
                            w.u8(range);
                            w.u8(delta);
                            w.u16(out);
                            w.u16(next);
                        }
                    }
                }
            }
        }

        if !self.terminators.is_empty() {
            w.align();
            w.patch_u32(header + 20, w.len());
            w.u16(format::STATE_TERMINATORS);
            w.u16(self.terminators.len() as u16);
            for &t in &self.terminators {
                w.u16(t);
            }
        }

        if !self.sequences.is_empty() {
            w.align();
            let index = w.len();
            w.patch_u32(header + 24, index);
            w.u16(format::SEQUENCE_DATA_INDEX);
            w.u16(self.sequences.len() as u16);
            // offsets are relative to the index and bracket each payload
            let mut offset = 4 + (self.sequences.len() + 1) * 2;
            w.u16(offset as u16);
            for seq in &self.sequences {
                offset += seq.len() * 2;
                w.u16(offset as u16);
            }
            for seq in &self.sequences {
                for &unit in seq {
                    w.u16(unit);
                }
            }
        }

        w.buf
    }
}

#[derive(Default)]
struct Writer {
    buf: Vec<u8>,
}

impl Writer {
    fn len(&self) -> usize {
        self.buf.len()
    }

    fn u8(&mut self, v: u8) {
        self.buf.push(v);
    }

    fn u16(&mut self, v: u16) {
        self.buf.extend_from_slice(&v.to_le_bytes());
    }

    fn u32(&mut self, v: u32) {
        self.buf.extend_from_slice(&v.to_le_bytes());
    }

    fn align(&mut self) {
        while self.buf.len() % 4 != 0 {
            self.buf.push(0);
        }
    }

    fn reserve_u32(&mut self, count: usize) -> usize {
        let at = self.len();
        self.buf.resize(at + count * 4, 0);
        at
    }

    fn patch_u32(&mut self, at: usize, v: usize) {
        self.buf[at..at + 4].copy_from_slice(&(v as u32).to_le_bytes());
    }
}
