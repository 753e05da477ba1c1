use std::fmt;

use serde::Serialize;

/// Width of the count prefix and of each target in an `InlineSwitch` operand.
pub const SWITCH_ENTRY_SIZE: usize = 4;

/// Encoding of the operand bytes that follow an opcode.
///
/// Names follow the operand types of ECMA-335 Partition VI §C.2.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
pub enum OperandKind {
    /// No operand.
    InlineNone,
    /// 32-bit branch offset.
    InlineBrTarget,
    /// 8-bit branch offset.
    ShortInlineBrTarget,
    /// 32-bit field token.
    InlineField,
    /// 32-bit integer.
    InlineI,
    /// 64-bit integer.
    InlineI8,
    /// 8-bit integer.
    ShortInlineI,
    /// 32-bit method token.
    InlineMethod,
    /// 64-bit float.
    InlineR,
    /// 32-bit float.
    ShortInlineR,
    /// 32-bit signature token.
    InlineSig,
    /// 32-bit string token.
    InlineString,
    /// Jump table: a 32-bit target count `N` followed by `N` 32-bit offsets.
    InlineSwitch,
    /// 32-bit metadata token (method, field or type).
    InlineTok,
    /// 32-bit type token.
    InlineType,
    /// 16-bit argument or local index.
    InlineVar,
    /// 8-bit argument or local index.
    ShortInlineVar,
}

/// Size class of an [`OperandKind`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum OperandSize {
    /// Always exactly this many bytes.
    Fixed(usize),
    /// Determined by a count prefix read from the stream.
    Dynamic,
}

impl OperandKind {
    pub const fn size(self) -> OperandSize {
        match self {
            OperandKind::InlineNone => OperandSize::Fixed(0),
            OperandKind::ShortInlineBrTarget
            | OperandKind::ShortInlineI
            | OperandKind::ShortInlineVar => OperandSize::Fixed(1),
            OperandKind::InlineVar => OperandSize::Fixed(2),
            OperandKind::InlineBrTarget
            | OperandKind::InlineField
            | OperandKind::InlineI
            | OperandKind::InlineMethod
            | OperandKind::ShortInlineR
            | OperandKind::InlineSig
            | OperandKind::InlineString
            | OperandKind::InlineTok
            | OperandKind::InlineType => OperandSize::Fixed(4),
            OperandKind::InlineI8 | OperandKind::InlineR => OperandSize::Fixed(8),
            OperandKind::InlineSwitch => OperandSize::Dynamic,
        }
    }

    /// Whether the operand length must be read from the stream.
    #[inline]
    pub const fn is_dynamic(self) -> bool {
        matches!(self.size(), OperandSize::Dynamic)
    }

    /// Fixed operand size in bytes.
    ///
    /// # Panics
    ///
    /// Panics for [`OperandKind::InlineSwitch`]. Its length depends on the
    /// stream and has to be resolved by the caller before asking for a size.
    pub const fn fixed_size(self) -> usize {
        match self.size() {
            OperandSize::Fixed(n) => n,
            OperandSize::Dynamic => panic!("InlineSwitch operand has no fixed size"),
        }
    }

    /// Largest fixed operand size of any kind.
    pub const MAX_FIXED_SIZE: usize = 8;
}

/// Fixed operand size for `kind`. See [`OperandKind::fixed_size`].
#[inline]
pub const fn operand_byte_size(kind: OperandKind) -> usize {
    kind.fixed_size()
}

impl fmt::Display for OperandKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}
