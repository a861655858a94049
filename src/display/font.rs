/*
 *  display/font.rs
 *
 *  Cabinet - insert coin
 *  (c) 2020-26 Stuart Hunter
 *
 *  14-segment alphanumeric font and precomputed integer glyphs
 *
 *  This program is free software: you can redistribute it and/or modify
 *  it under the terms of the GNU General Public License as published by
 *  the Free Software Foundation, either version 3 of the License, or
 *  (at your option) any later version.
 *
 *  This program is distributed in the hope that it will be useful,
 *  but WITHOUT ANY WARRANTY; without even the implied warranty of
 *  MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
 *  GNU General Public License for more details.
 *
 *  See <http://www.gnu.org/licenses/> to get a copy of the GNU General
 *  Public License.
 *
 */

//! Segment bits, LSB first: A B C D E F G1 G2 H J K L M N DP.

use crate::display::surface::{CELLS, Segments};

pub const BLANK: u16 = 0;

/// Shown for anything outside printable ASCII; every segment lit
pub const UNDISPLAYABLE: u16 = 0x3FFF;

pub const MINUS: u16 = 0x00C0;

const FIRST_PRINTABLE: u32 = 0x20;

#[rustfmt::skip]
const ASCII: [u16; 95] = [
    0b0000000000000000, // ' '
    0b0000000000000110, // !
    0b0000001000100000, // "
    0b0001001011001110, // #
    0b0001001011101101, // $
    0b0000110000100100, // %
    0b0010001101011101, // &
    0b0000010000000000, // '
    0b0010010000000000, // (
    0b0000100100000000, // )
    0b0011111111000000, // *
    0b0001001011000000, // +
    0b0000100000000000, // ,
    0b0000000011000000, // -
    0b0100000000000000, // .
    0b0000110000000000, // /
    0b0000110000111111, // 0
    0b0000000000000110, // 1
    0b0000000011011011, // 2
    0b0000000010001111, // 3
    0b0000000011100110, // 4
    0b0010000001101001, // 5
    0b0000000011111101, // 6
    0b0000000000000111, // 7
    0b0000000011111111, // 8
    0b0000000011101111, // 9
    0b0001001000000000, // :
    0b0000101000000000, // ;
    0b0010010000000000, // <
    0b0000000011001000, // =
    0b0000100100000000, // >
    0b0001000010000011, // ?
    0b0000001010111011, // @
    0b0000000011110111, // A
    0b0001001010001111, // B
    0b0000000000111001, // C
    0b0001001000001111, // D
    0b0000000011111001, // E
    0b0000000001110001, // F
    0b0000000010111101, // G
    0b0000000011110110, // H
    0b0001001000001001, // I
    0b0000000000011110, // J
    0b0010010001110000, // K
    0b0000000000111000, // L
    0b0000010100110110, // M
    0b0010000100110110, // N
    0b0000000000111111, // O
    0b0000000011110011, // P
    0b0010000000111111, // Q
    0b0010000011110011, // R
    0b0000000011101101, // S
    0b0001001000000001, // T
    0b0000000000111110, // U
    0b0000110000110000, // V
    0b0010100000110110, // W
    0b0010110100000000, // X
    0b0001010100000000, // Y
    0b0000110000001001, // Z
    0b0000000000111001, // [
    0b0010000100000000, // \
    0b0000000000001111, // ]
    0b0000110000000011, // ^
    0b0000000000001000, // _
    0b0000000100000000, // `
    0b0001000001011000, // a
    0b0010000001111000, // b
    0b0000000011011000, // c
    0b0000100010001110, // d
    0b0000100001011000, // e
    0b0000000001110001, // f
    0b0000010010001110, // g
    0b0001000001110000, // h
    0b0001000000000000, // i
    0b0000000000001110, // j
    0b0011011000000000, // k
    0b0000000000110000, // l
    0b0001000011010100, // m
    0b0001000001010000, // n
    0b0000000011011100, // o
    0b0000000101110000, // p
    0b0000010010000110, // q
    0b0000000001010000, // r
    0b0010000010001000, // s
    0b0000000001111000, // t
    0b0000000000011100, // u
    0b0010000000000100, // v
    0b0010100000010100, // w
    0b0010100011000000, // x
    0b0010000000001100, // y
    0b0000100001001000, // z
    0b0000100101001001, // {
    0b0001001000000000, // |
    0b0010010010001001, // }
    0b0000010100100000, // ~
];

/// Segment mask for one character
pub fn glyph(c: char) -> u16 {
    let code = c as u32;
    match code.checked_sub(FIRST_PRINTABLE) {
        Some(offset) if (offset as usize) < ASCII.len() => ASCII[offset as usize],
        _ => UNDISPLAYABLE,
    }
}

const fn digit(d: usize) -> u16 {
    ASCII[(b'0' as usize - FIRST_PRINTABLE as usize) + d]
}

const fn build_integer_table() -> [Segments; 256] {
    let mut table = [[BLANK; CELLS]; 256];
    let mut n = 0;
    while n < 256 {
        let mut cells = [BLANK; CELLS];
        let mut value = n;
        let mut cell = CELLS;
        loop {
            cell -= 1;
            cells[cell] = digit(value % 10);
            value /= 10;
            if value == 0 {
                break;
            }
        }
        table[n] = cells;
        n += 1;
    }
    table
}

/// Right aligned renderings of 0..=255 with leading blanks
pub static INTEGER_TABLE: [Segments; 256] = build_integer_table();
