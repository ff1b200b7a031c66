// Shared layout fixtures for integration tests

#![allow(dead_code)]

use layoutkeys_core::layout::{StateEntries, StateRecord, UchrBuilder};
use layoutkeys_core::native::vk;

pub const SHIFT_INDEX: u32 = 0b0_0010;
pub const CAPS_INDEX: u32 = 0b0_0100;
pub const OPTION_INDEX: u32 = 0b0_1000;
pub const SHIFT_OPTION_INDEX: u32 = 0b0_1010;
pub const COMMAND_INDEX: u32 = 0b0_0001;

fn cell(code: u16) -> u32 {
    u32::from(code)
}

/// A small US-style layout with an Option+E acute dead key.
///
/// Letters a, s and e, the digit row key 1, space, return, tab, delete and
/// escape are defined. Option+e arms the acute accent which composes with
/// e, E and space.
pub fn us_layout() -> UchrBuilder {
    let mut b = UchrBuilder::new(128);
    let plain = b.add_table();
    let shift = b.add_table();
    let caps = b.add_table();
    let option = b.add_table();
    let shift_option = b.add_table();
    let command = b.add_table();
    b.map_modifier(SHIFT_INDEX, shift);
    b.map_modifier(CAPS_INDEX, caps);
    b.map_modifier(OPTION_INDEX, option);
    b.map_modifier(SHIFT_OPTION_INDEX, shift_option);
    b.map_modifier(COMMAND_INDEX, command);

    let acute = b.add_terminator('´');
    let dead_acute = b.add_state_record(StateRecord::dead(acute));
    let e = b.add_state_record(StateRecord::new(
        'e',
        StateEntries::Terminal(vec![(acute, 0x00E9)]),
    ));
    let upper_e = b.add_state_record(StateRecord::new(
        'E',
        StateEntries::Terminal(vec![(acute, 0x00C9)]),
    ));
    let space = b.add_state_record(StateRecord::new(
        ' ',
        StateEntries::Terminal(vec![(acute, 0x00B4)]),
    ));

    for table in [plain, shift, caps, option, shift_option, command] {
        b.set_state(table, cell(vk::SPACE), space);
        b.set_char(table, cell(vk::RETURN), '\r');
        b.set_char(table, cell(vk::TAB), '\t');
        b.set_char(table, cell(vk::DELETE), '\u{8}');
        b.set_char(table, cell(vk::ESCAPE), '\u{1b}');
    }

    b.set_char(plain, cell(vk::ANSI_A), 'a');
    b.set_char(plain, cell(vk::ANSI_S), 's');
    b.set_state(plain, cell(vk::ANSI_E), e);
    b.set_char(plain, cell(vk::ANSI_1), '1');

    b.set_char(shift, cell(vk::ANSI_A), 'A');
    b.set_char(shift, cell(vk::ANSI_S), 'S');
    b.set_state(shift, cell(vk::ANSI_E), upper_e);
    b.set_char(shift, cell(vk::ANSI_1), '!');

    b.set_char(caps, cell(vk::ANSI_A), 'A');
    b.set_char(caps, cell(vk::ANSI_S), 'S');
    b.set_state(caps, cell(vk::ANSI_E), upper_e);
    b.set_char(caps, cell(vk::ANSI_1), '1');

    b.set_char(option, cell(vk::ANSI_A), 'å');
    b.set_char(option, cell(vk::ANSI_S), 'ß');
    b.set_state(option, cell(vk::ANSI_E), dead_acute);
    b.set_char(option, cell(vk::ANSI_1), '¡');

    b.set_char(shift_option, cell(vk::ANSI_A), 'Å');
    b.set_char(shift_option, cell(vk::ANSI_S), 'Í');
    b.set_char(shift_option, cell(vk::ANSI_1), '⁄');

    b.set_char(command, cell(vk::ANSI_A), 'a');
    b.set_char(command, cell(vk::ANSI_S), 's');
    b.set_char(command, cell(vk::ANSI_E), 'e');
    b
}

/// Same positions as [`us_layout`] but typing q where a would be
pub fn french_layout() -> UchrBuilder {
    let mut b = UchrBuilder::new(128);
    let plain = b.add_table();
    let shift = b.add_table();
    b.map_modifier(SHIFT_INDEX, shift);
    b.set_char(plain, cell(vk::ANSI_A), 'q');
    b.set_char(shift, cell(vk::ANSI_A), 'Q');
    b.set_char(plain, cell(vk::ANSI_1), '&');
    b.set_char(shift, cell(vk::ANSI_1), '1');
    b
}
