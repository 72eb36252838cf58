//! DxLib blend modes and their backend translation.

use super::backend::{BlendEquation, BlendFactor, TexturePreset};

pub const DX_BLENDMODE_NOBLEND: i32 = 0;
pub const DX_BLENDMODE_ALPHA: i32 = 1;
pub const DX_BLENDMODE_ADD: i32 = 2;
pub const DX_BLENDMODE_SUB: i32 = 3;
pub const DX_BLENDMODE_MUL: i32 = 4;
pub const DX_BLENDMODE_SUB2: i32 = 5;
pub const DX_BLENDMODE_XOR: i32 = 6;
pub const DX_BLENDMODE_DESTCOLOR: i32 = 8;
pub const DX_BLENDMODE_INVDESTCOLOR: i32 = 9;
pub const DX_BLENDMODE_INVSRC: i32 = 10;
pub const DX_BLENDMODE_MULA: i32 = 11;
pub const DX_BLENDMODE_ALPHA_X4: i32 = 12;
pub const DX_BLENDMODE_ADD_X4: i32 = 13;
pub const DX_BLENDMODE_SRCCOLOR: i32 = 14;
pub const DX_BLENDMODE_HALF_ADD: i32 = 15;
pub const DX_BLENDMODE_SUB1: i32 = 16;
pub const DX_BLENDMODE_PMA_ALPHA: i32 = 17;
pub const DX_BLENDMODE_PMA_ADD: i32 = 18;
pub const DX_BLENDMODE_PMA_SUB: i32 = 19;
pub const DX_BLENDMODE_PMA_INVSRC: i32 = 20;
pub const DX_BLENDMODE_PMA_ALPHA_X4: i32 = 21;
pub const DX_BLENDMODE_PMA_ADD_X4: i32 = 22;
pub const DX_BLENDMODE_NUM: i32 = 23;

/// First extended mode.
pub const DX_BLENDMODE_EXT: i32 = 0x1000;
/// Alpha blend that keeps destination alpha coverage.
pub const DX_BLENDMODE_EXT_PSALPHA: i32 = DX_BLENDMODE_EXT;
/// Alpha blend that leaves destination alpha untouched.
pub const DX_BLENDMODE_EXT_DSTALPHA: i32 = DX_BLENDMODE_EXT + 1;
pub const DX_BLENDMODE_EXT_NUM: i32 = 2;

/// One row of the blend tables.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlendInfo {
    pub preset: TexturePreset,
    pub equation: BlendEquation,
    pub src_rgb: BlendFactor,
    pub dst_rgb: BlendFactor,
    pub src_alpha: BlendFactor,
    pub dst_alpha: BlendFactor,
}

const fn row(
    preset: TexturePreset,
    equation: BlendEquation,
    src_rgb: BlendFactor,
    dst_rgb: BlendFactor,
    src_alpha: BlendFactor,
    dst_alpha: BlendFactor,
) -> BlendInfo {
    BlendInfo {
        preset,
        equation,
        src_rgb,
        dst_rgb,
        src_alpha,
        dst_alpha,
    }
}

use BlendEquation::{Add, Disable, ReverseSubtract as RSub};
use BlendFactor::{
    DstColor, One, OneMinusDstColor, OneMinusSrcAlpha, SrcAlpha, SrcColor, Zero,
};
use TexturePreset::{DxInvert, DxMula, DxPma, DxPmaInvert, DxPmaX4, DxX4, Modulate};

static BLEND_MODE_TABLE: [BlendInfo; DX_BLENDMODE_NUM as usize] = [
    row(Modulate, Disable, One, One, One, One), // NOBLEND
    row(Modulate, Add, SrcAlpha, OneMinusSrcAlpha, One, One), // ALPHA
    row(Modulate, Add, SrcAlpha, One, Zero, One), // ADD
    row(Modulate, RSub, SrcAlpha, One, Zero, One), // SUB
    row(Modulate, Add, Zero, SrcColor, Zero, One), // MUL
    row(Modulate, Add, SrcAlpha, One, Zero, One), // SUB2
    row(Modulate, Disable, One, One, One, One), // XOR
    row(Modulate, Disable, One, One, One, One), // reserved
    row(Modulate, Add, Zero, One, Zero, One), // DESTCOLOR
    row(Modulate, Add, OneMinusDstColor, Zero, Zero, One), // INVDESTCOLOR
    row(DxInvert, Add, SrcAlpha, OneMinusSrcAlpha, Zero, One), // INVSRC
    row(DxMula, Add, DstColor, OneMinusSrcAlpha, Zero, One), // MULA
    row(DxX4, Add, SrcAlpha, OneMinusSrcAlpha, One, OneMinusSrcAlpha), // ALPHA_X4
    row(DxX4, Add, SrcAlpha, One, Zero, One), // ADD_X4
    row(Modulate, Disable, One, Zero, One, Zero), // SRCCOLOR
    row(Modulate, Add, One, OneMinusSrcAlpha, One, One), // HALF_ADD
    row(Modulate, RSub, OneMinusSrcAlpha, One, Zero, One), // SUB1
    row(DxPma, Add, One, OneMinusSrcAlpha, Zero, One), // PMA_ALPHA
    row(DxPma, Add, One, One, Zero, One), // PMA_ADD
    row(DxPma, RSub, One, One, Zero, One), // PMA_SUB
    row(DxPmaInvert, Add, One, OneMinusSrcAlpha, Zero, One), // PMA_INVSRC
    row(DxPmaX4, Add, One, OneMinusSrcAlpha, Zero, One), // PMA_ALPHA_X4
    row(DxPmaX4, Add, One, One, Zero, One), // PMA_ADD_X4
];

static BLEND_MODE_EXT_TABLE: [BlendInfo; DX_BLENDMODE_EXT_NUM as usize] = [
    row(Modulate, Add, SrcAlpha, OneMinusSrcAlpha, One, OneMinusSrcAlpha), // PSALPHA
    row(Modulate, Add, SrcAlpha, OneMinusSrcAlpha, Zero, One), // DSTALPHA
];

/// `true` if `mode` indexes either table.
#[must_use]
pub const fn is_valid_mode(mode: i32) -> bool {
    (mode >= 0 && mode < DX_BLENDMODE_NUM)
        || (mode >= DX_BLENDMODE_EXT && mode < DX_BLENDMODE_EXT + DX_BLENDMODE_EXT_NUM)
}

/// Resolve a blend mode to its table row.
///
/// Anything outside both tables falls back to NOBLEND; the resolved mode is
/// returned alongside the row.
#[must_use]
pub fn lookup(mode: i32) -> (i32, &'static BlendInfo) {
    if (0..DX_BLENDMODE_NUM).contains(&mode) {
        (mode, &BLEND_MODE_TABLE[mode as usize])
    } else if (DX_BLENDMODE_EXT..DX_BLENDMODE_EXT + DX_BLENDMODE_EXT_NUM).contains(&mode) {
        (mode, &BLEND_MODE_EXT_TABLE[(mode - DX_BLENDMODE_EXT) as usize])
    } else {
        (
            DX_BLENDMODE_NOBLEND,
            &BLEND_MODE_TABLE[DX_BLENDMODE_NOBLEND as usize],
        )
    }
}
