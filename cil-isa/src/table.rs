//! The opcode catalog.
//!
//! Every CIL opcode from ECMA-335 Partition III, with its mnemonic, a short
//! description, its category and the kind of operand that follows it. The
//! catalog is plain `const` data plus two dense lookup tables (one for
//! single-byte opcodes, one for the space behind [`TWO_BYTE_ESCAPE`]), so
//! lookups are a single array index and need no initialisation.
//!
//! A few mnemonics carry a trailing space (`"beq.s "`, `"bge.s "`,
//! `"bgt.s "`). They are kept as-is so listings stay byte-compatible with
//! existing tooling.

use serde::Serialize;

use crate::opcode::{OpcodeCategory, OpcodeId, TWO_BYTE_ESCAPE};
use crate::operand::OperandKind;

/// Static description of one opcode.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct OpcodeInfo {
    id: OpcodeId,
    mnemonic: &'static str,
    description: &'static str,
    category: OpcodeCategory,
    #[serde(rename = "operand_kind")]
    operand: OperandKind,
}

impl OpcodeInfo {
    #[inline]
    pub const fn id(&self) -> OpcodeId {
        self.id
    }

    #[inline]
    pub const fn mnemonic(&self) -> &'static str {
        self.mnemonic
    }

    #[inline]
    pub const fn description(&self) -> &'static str {
        self.description
    }

    #[inline]
    pub const fn category(&self) -> OpcodeCategory {
        self.category
    }

    #[inline]
    pub const fn operand_kind(&self) -> OperandKind {
        self.operand
    }

    /// Encoded length of the opcode bytes (1 or 2), excluding operands.
    #[inline]
    pub const fn opcode_len(&self) -> usize {
        self.id.len()
    }

    /// Prefix opcodes (`tail.`, `volatile.`, ...) modify the next instruction.
    #[inline]
    pub const fn is_prefix(&self) -> bool {
        matches!(self.category, OpcodeCategory::Prefix)
    }
}

const fn one(
    byte: u8,
    mnemonic: &'static str,
    category: OpcodeCategory,
    operand: OperandKind,
    description: &'static str,
) -> OpcodeInfo {
    OpcodeInfo {
        id: OpcodeId::single(byte),
        mnemonic,
        description,
        category,
        operand,
    }
}

const fn two(
    byte: u8,
    mnemonic: &'static str,
    category: OpcodeCategory,
    operand: OperandKind,
    description: &'static str,
) -> OpcodeInfo {
    OpcodeInfo {
        id: OpcodeId::double(TWO_BYTE_ESCAPE, byte),
        mnemonic,
        description,
        category,
        operand,
    }
}

use OpcodeCategory::{Base, ObjectModel, Prefix};
use OperandKind::*;

#[rustfmt::skip]
const CATALOG: [OpcodeInfo; 219] = [
    one(0x00, "nop", Base, InlineNone, "Do nothing (No operation)."),
    one(0x01, "break", Base, InlineNone, "Inform a debugger that a breakpoint has been reached."),
    one(0x02, "ldarg.0", Base, InlineNone, "Load argument 0 onto the stack."),
    one(0x03, "ldarg.1", Base, InlineNone, "Load argument 1 onto the stack."),
    one(0x04, "ldarg.2", Base, InlineNone, "Load argument 2 onto the stack."),
    one(0x05, "ldarg.3", Base, InlineNone, "Load argument 3 onto the stack."),
    one(0x06, "ldloc.0", Base, InlineNone, "Load local variable 0 onto stack."),
    one(0x07, "ldloc.1", Base, InlineNone, "Load local variable 1 onto stack."),
    one(0x08, "ldloc.2", Base, InlineNone, "Load local variable 2 onto stack."),
    one(0x09, "ldloc.3", Base, InlineNone, "Load local variable 3 onto stack."),
    one(0x0A, "stloc.0", Base, InlineNone, "Pop a value from stack into local variable 0."),
    one(0x0B, "stloc.1", Base, InlineNone, "Pop a value from stack into local variable 1."),
    one(0x0C, "stloc.2", Base, InlineNone, "Pop a value from stack into local variable 2."),
    one(0x0D, "stloc.3", Base, InlineNone, "Pop a value from stack into local variable 3."),
    one(0x0E, "ldarg.s", Base, ShortInlineVar, "Load argument numbered num onto the stack, short form."),
    one(0x0F, "ldarga.s", Base, ShortInlineVar, "Fetch the address of argument argNum, short form."),
    one(0x10, "starg.s", Base, ShortInlineVar, "Store value to the argument numbered num, short form."),
    one(0x11, "ldloc.s", Base, ShortInlineVar, "Load local variable of index indx onto stack, short form."),
    one(0x12, "ldloca.s", Base, ShortInlineVar, "Load address of local variable with index indx, short form."),
    one(0x13, "stloc.s", Base, ShortInlineVar, "Pop a value from stack into local variable indx, short form."),
    one(0x14, "ldnull", Base, InlineNone, "Push a null reference on the stack."),
    one(0x15, "ldc.i4.m1", Base, InlineNone, "Push -1 onto the stack as int32."),
    one(0x16, "ldc.i4.0", Base, InlineNone, "Push 0 onto the stack as int32."),
    one(0x17, "ldc.i4.1", Base, InlineNone, "Push 1 onto the stack as int32."),
    one(0x18, "ldc.i4.2", Base, InlineNone, "Push 2 onto the stack as int32."),
    one(0x19, "ldc.i4.3", Base, InlineNone, "Push 3 onto the stack as int32."),
    one(0x1A, "ldc.i4.4", Base, InlineNone, "Push 4 onto the stack as int32."),
    one(0x1B, "ldc.i4.5", Base, InlineNone, "Push 5 onto the stack as int32."),
    one(0x1C, "ldc.i4.6", Base, InlineNone, "Push 6 onto the stack as int32."),
    one(0x1D, "ldc.i4.7", Base, InlineNone, "Push 7 onto the stack as int32."),
    one(0x1E, "ldc.i4.8", Base, InlineNone, "Push 8 onto the stack as int32."),
    one(0x1F, "ldc.i4.s", Base, ShortInlineI, "Push num onto the stack as int32, short form."),
    one(0x20, "ldc.i4", Base, InlineI, "Push num of type int32 onto the stack as int32."),
    one(0x21, "ldc.i8", Base, InlineI8, "Push num of type int64 onto the stack as int64."),
    one(0x22, "ldc.r4", Base, ShortInlineR, "Push num of type float32 onto the stack as F."),
    one(0x23, "ldc.r8", Base, InlineR, "Push num of type float64 onto the stack as F."),
    one(0x25, "dup", Base, InlineNone, "Duplicate the value on the top of the stack."),
    one(0x26, "pop", Base, InlineNone, "Pop value from the stack."),
    one(0x27, "jmp", Base, InlineMethod, "Exit current method and jump to the specified method."),
    one(0x28, "call", Base, InlineMethod, "Call method described by method."),
    one(0x29, "calli", Base, InlineSig, "Call method indicated on the stack with arguments described by callsitedescr."),
    one(0x2A, "ret", Base, InlineNone, "Return from method, possibly with a value."),
    one(0x2B, "br.s", Base, ShortInlineBrTarget, "Branch to target, short form."),
    one(0x2C, "brfalse.s", Base, ShortInlineBrTarget, "Branch to target if value is zero (false), short form."),
    one(0x2D, "brtrue.s", Base, ShortInlineBrTarget, "Branch to target if value is non-zero (true), short form."),
    one(0x2E, "beq.s ", Base, ShortInlineBrTarget, "Branch to target if equal, short form."),
    one(0x2F, "bge.s ", Base, ShortInlineBrTarget, "Branch to target if greater than or equal to, short form."),
    one(0x30, "bgt.s ", Base, ShortInlineBrTarget, "Branch to target if greater than, short form."),
    one(0x31, "ble.s", Base, ShortInlineBrTarget, "Branch to target if less than or equal to, short form."),
    one(0x32, "blt.s", Base, ShortInlineBrTarget, "Branch to target if less than, short form."),
    one(0x33, "bne.un.s", Base, ShortInlineBrTarget, "Branch to target if unequal or unordered, short form."),
    one(0x34, "bge.un.s", Base, ShortInlineBrTarget, "Branch to target if greater than or equal to (unsigned or unordered), short form"),
    one(0x35, "bgt.un.s", Base, ShortInlineBrTarget, "Branch to target if greater than (unsigned or unordered), short form."),
    one(0x36, "ble.un.s", Base, ShortInlineBrTarget, "Branch to target if less than or equal to (unsigned or unordered), short form"),
    one(0x37, "blt.un.s", Base, ShortInlineBrTarget, "Branch to target if less than (unsigned or unordered), short form."),
    one(0x38, "br", Base, InlineBrTarget, "Branch to target."),
    one(0x39, "brfalse", Base, InlineBrTarget, "Branch to target if value is zero (false)."),
    one(0x3A, "brtrue", Base, InlineBrTarget, "Branch to target if value is non-zero (true)."),
    one(0x3B, "beq", Base, InlineBrTarget, "Branch to target if equal."),
    one(0x3C, "bge", Base, InlineBrTarget, "Branch to target if greater than or equal to."),
    one(0x3D, "bgt", Base, InlineBrTarget, "Branch to target if greater than."),
    one(0x3E, "ble", Base, InlineBrTarget, "Branch to target if less than or equal to."),
    one(0x3F, "blt", Base, InlineBrTarget, "Branch to target if less than."),
    one(0x40, "bne.un", Base, InlineBrTarget, "Branch to target if unequal or unordered."),
    one(0x41, "bge.un", Base, InlineBrTarget, "Branch to target if greater than or equal to (unsigned or unordered)."),
    one(0x42, "bgt.un", Base, InlineBrTarget, "Branch to target if greater than (unsigned or unordered)."),
    one(0x43, "ble.un", Base, InlineBrTarget, "Branch to target if less than or equal to (unsigned or unordered)."),
    one(0x44, "blt.un", Base, InlineBrTarget, "Branch to target if less than (unsigned or unordered)."),
    one(0x45, "switch", Base, InlineSwitch, "Jump to one of n values."),
    one(0x46, "ldind.i1", Base, InlineNone, "Indirect load value of type int8 as int32 on the stack."),
    one(0x47, "ldind.u1", Base, InlineNone, "Indirect load value of type unsigned int8 as int32 on the stack"),
    one(0x48, "ldind.i2", Base, InlineNone, "Indirect load value of type int16 as int32 on the stack."),
    one(0x49, "ldind.u2", Base, InlineNone, "Indirect load value of type unsigned int16 as int32 on the stack"),
    one(0x4A, "ldind.i4", Base, InlineNone, "Indirect load value of type int32 as int32 on the stack."),
    one(0x4B, "ldind.u4", Base, InlineNone, "Indirect load value of type unsigned int32 as int32 on the stack"),
    one(0x4C, "ldind.i8", Base, InlineNone, "Indirect load value of type int64 as int64 on the stack."),
    one(0x4D, "ldind.i", Base, InlineNone, "Indirect load value of type native int as native int on the stack"),
    one(0x4E, "ldind.r4", Base, InlineNone, "Indirect load value of type float32 as F on the stack."),
    one(0x4F, "ldind.r8", Base, InlineNone, "Indirect load value of type float64 as F on the stack."),
    one(0x50, "ldind.ref", Base, InlineNone, "Indirect load value of type object ref as O on the stack."),
    one(0x51, "stind.ref", Base, InlineNone, "Store value of type object ref (type O) into memory at address"),
    one(0x52, "stind.i1", Base, InlineNone, "Store value of type int8 into memory at address"),
    one(0x53, "stind.i2", Base, InlineNone, "Store value of type int16 into memory at address"),
    one(0x54, "stind.i4", Base, InlineNone, "Store value of type int32 into memory at address"),
    one(0x55, "stind.i8", Base, InlineNone, "Store value of type int64 into memory at address"),
    one(0x56, "stind.r4", Base, InlineNone, "Store value of type float32 into memory at address"),
    one(0x57, "stind.r8", Base, InlineNone, "Store value of type float64 into memory at address"),
    one(0x58, "add", Base, InlineNone, "Add two values, returning a new value."),
    one(0x59, "sub", Base, InlineNone, "Subtract value2 from value1, returning a new value."),
    one(0x5A, "mul", Base, InlineNone, "Multiply values."),
    one(0x5B, "div", Base, InlineNone, "Divide two values to return a quotient or floating-point result."),
    one(0x5C, "div.un", Base, InlineNone, "Divide two values, unsigned, returning a quotient."),
    one(0x5D, "rem", Base, InlineNone, "Remainder when dividing one value by another."),
    one(0x5E, "rem.un", Base, InlineNone, "Remainder when dividing one unsigned value by another."),
    one(0x5F, "and", Base, InlineNone, "Bitwise AND of two integral values, returns an integral value."),
    one(0x60, "or", Base, InlineNone, "Bitwise OR of two integer values, returns an integer."),
    one(0x61, "xor", Base, InlineNone, "Bitwise XOR of integer values, returns an integer."),
    one(0x62, "shl", Base, InlineNone, "Shift an integer left (shifting in zeros), return an integer."),
    one(0x63, "shr", Base, InlineNone, "Shift an integer right (shift in sign), return an integer."),
    one(0x64, "shr.un", Base, InlineNone, "Shift an integer right (shift in zero), return an integer."),
    one(0x65, "neg", Base, InlineNone, "Negate value."),
    one(0x66, "not", Base, InlineNone, "Bitwise complement (logical not)."),
    one(0x67, "conv.i1", Base, InlineNone, "Convert to int8, pushing int32 on stack."),
    one(0x68, "conv.i2", Base, InlineNone, "Convert to int16, pushing int32 on stack."),
    one(0x69, "conv.i4", Base, InlineNone, "Convert to int32, pushing int32 on stack."),
    one(0x6A, "conv.i8", Base, InlineNone, "Convert to int64, pushing int64 on stack."),
    one(0x6B, "conv.r4", Base, InlineNone, "Convert to float32, pushing F on stack."),
    one(0x6C, "conv.r8", Base, InlineNone, "Convert to float64, pushing F on stack."),
    one(0x6D, "conv.u4", Base, InlineNone, "Convert to unsigned int32, pushing int32 on stack."),
    one(0x6E, "conv.u8", Base, InlineNone, "Convert to unsigned int64, pushing int64 on stack."),
    one(0x6F, "callvirt", ObjectModel, InlineMethod, "Call a method associated with an object."),
    one(0x70, "cpobj", ObjectModel, InlineType, "Copy a value type from src to dest."),
    one(0x71, "ldobj", ObjectModel, InlineType, "Copy the value stored at address src to the stack."),
    one(0x72, "ldstr", ObjectModel, InlineString, "Push a string object for the literal string."),
    one(0x73, "newobj", ObjectModel, InlineMethod, "Allocate an uninitialized object or value type and call ctor."),
    one(0x74, "castclass", ObjectModel, InlineType, "Cast obj to class."),
    one(0x75, "isinst", ObjectModel, InlineType, "Test if obj is an instance of class, returning null or an instance of that class or interface."),
    one(0x76, "conv.r.un", Base, InlineNone, "Convert unsigned integer to floating-point, pushing F on stack."),
    one(0x79, "unbox", ObjectModel, InlineType, "Extract a value-type from obj, its boxed representation."),
    one(0x7A, "throw", ObjectModel, InlineNone, "Throw an exception."),
    one(0x7B, "ldfld", ObjectModel, InlineField, "Push the value of field of object (or value type) obj, onto the stack."),
    one(0x7C, "ldflda", ObjectModel, InlineField, "Push the address of field of object obj on the stack."),
    one(0x7D, "stfld", ObjectModel, InlineField, "Replace the value of field of the object obj with value."),
    one(0x7E, "ldsfld", ObjectModel, InlineField, "Push the value of the static field on the stack."),
    one(0x7F, "ldsflda", ObjectModel, InlineField, "Push the address of the static field, field, on the stack."),
    one(0x80, "stsfld", ObjectModel, InlineField, "Replace the value of the static field with val."),
    one(0x81, "stobj", ObjectModel, InlineType, "Store a value of type typeTok at an address."),
    one(0x82, "conv.ovf.i1.un", Base, InlineNone, "Convert unsigned to an int8 (on the stack as int32) and throw an exception on overflow."),
    one(0x83, "conv.ovf.i2.un", Base, InlineNone, "Convert unsigned to an int16 (on the stack as int32) and throw an exception on overflow."),
    one(0x84, "conv.ovf.i4.un", Base, InlineNone, "Convert unsigned to an int32 (on the stack as int32) and throw an exception on overflow."),
    one(0x85, "conv.ovf.i8.un", Base, InlineNone, "Convert unsigned to an int64 (on the stack as int64) and throw an exception on overflow."),
    one(0x86, "conv.ovf.u1.un", Base, InlineNone, "Convert unsigned to an unsigned int8 (on the stack as int32) and throw an exception on overflow."),
    one(0x87, "conv.ovf.u2.un", Base, InlineNone, "Convert unsigned to an unsigned int16 (on the stack as int32) and throw an exception on overflow."),
    one(0x88, "conv.ovf.u4.un", Base, InlineNone, "Convert unsigned to an unsigned int32 (on the stack as int32) and throw an exception on overflow."),
    one(0x89, "conv.ovf.u8.un", Base, InlineNone, "Convert unsigned to an unsigned int64 (on the stack as int64) and throw an exception on overflow."),
    one(0x8A, "conv.ovf.i.un", Base, InlineNone, "Convert unsigned to a native int (on the stack as native int) and throw an exception on overflow."),
    one(0x8B, "conv.ovf.u.un", Base, InlineNone, "Convert unsigned to a native unsigned int (on the stack as native int) and throw an exception on overflow."),
    one(0x8C, "box", ObjectModel, InlineType, "Convert a boxable value to its boxed form"),
    one(0x8D, "newarr", ObjectModel, InlineType, "Create a new array with elements of type etype."),
    one(0x8E, "ldlen", ObjectModel, InlineNone, "Push the length (of type native unsigned int) of array on the stack."),
    one(0x8F, "ldelema", ObjectModel, InlineType, "Load the address of element at index onto the top of the stack."),
    one(0x90, "ldelem.i1", ObjectModel, InlineNone, "Load the element with type int8 at index onto the top of the stack as an int32."),
    one(0x91, "ldelem.u1", ObjectModel, InlineNone, "Load the element with type unsigned int8 at index onto the top of the stack as an int32."),
    one(0x92, "ldelem.i2", ObjectModel, InlineNone, "Load the element with type int16 at index onto the top of the stack as an int32."),
    one(0x93, "ldelem.u2", ObjectModel, InlineNone, "Load the element with type unsigned int16 at index onto the top of the stack as an int32."),
    one(0x94, "ldelem.i4", ObjectModel, InlineNone, "Load the element with type int32 at index onto the top of the stack as an int32."),
    one(0x95, "ldelem.u4", ObjectModel, InlineNone, "Load the element with type unsigned int32 at index onto the top of the stack as an int32."),
    one(0x96, "ldelem.i8", ObjectModel, InlineNone, "Load the element with type int64 at index onto the top of the stack as an int64."),
    one(0x97, "ldelem.i", ObjectModel, InlineNone, "Load the element with type native int at index onto the top of the stack as a native int."),
    one(0x98, "ldelem.r4", ObjectModel, InlineNone, "Load the element with type float32 at index onto the top of the stack as an F"),
    one(0x99, "ldelem.r8", ObjectModel, InlineNone, "Load the element with type float64 at index onto the top of the stack as an F."),
    one(0x9A, "ldelem.ref", ObjectModel, InlineNone, "Load the element at index onto the top of the stack as an O. The type of the O is the same as the element type of the array pushed on the CIL stack."),
    one(0x9B, "stelem.i", ObjectModel, InlineNone, "Replace array element at index with the i value on the stack."),
    one(0x9C, "stelem.i1", ObjectModel, InlineNone, "Replace array element at index with the int8 value on the stack."),
    one(0x9D, "stelem.i2", ObjectModel, InlineNone, "Replace array element at index with the int16 value on the stack."),
    one(0x9E, "stelem.i4", ObjectModel, InlineNone, "Replace array element at index with the int32 value on the stack."),
    one(0x9F, "stelem.i8", ObjectModel, InlineNone, "Replace array element at index with the int64 value on the stack."),
    one(0xA0, "stelem.r4", ObjectModel, InlineNone, "Replace array element at index with the float32 value on the stack."),
    one(0xA1, "stelem.r8", ObjectModel, InlineNone, "Replace array element at index with the float64 value on the stack."),
    one(0xA2, "stelem.ref", ObjectModel, InlineNone, "Replace array element at index with the ref value on the stack."),
    one(0xA3, "ldelem", ObjectModel, InlineType, "Load the element at index onto the top of the stack."),
    one(0xA4, "stelem", ObjectModel, InlineType, "Replace array element at index with the value on the stack"),
    one(0xA5, "unbox.any", ObjectModel, InlineType, "Extract a value-type from obj, its boxed representation"),
    one(0xB3, "conv.ovf.i1", Base, InlineNone, "Convert to an int8 (on the stack as int32) and throw an exception on overflow."),
    one(0xB4, "conv.ovf.u1", Base, InlineNone, "Convert to an unsigned int8 (on the stack as int32) and throw an exception on overflow."),
    one(0xB5, "conv.ovf.i2", Base, InlineNone, "Convert to an int16 (on the stack as int32) and throw an exception on overflow."),
    one(0xB6, "conv.ovf.u2", Base, InlineNone, "Convert to an unsigned int16 (on the stack as int32) and throw an exception on overflow."),
    one(0xB7, "conv.ovf.i4", Base, InlineNone, "Convert to an int32 (on the stack as int32) and throw an exception on overflow."),
    one(0xB8, "conv.ovf.u4", Base, InlineNone, "Convert to an unsigned int32 (on the stack as int32) and throw an exception on overflow."),
    one(0xB9, "conv.ovf.i8", Base, InlineNone, "Convert to an int64 (on the stack as int64) and throw an exception on overflow."),
    one(0xBA, "conv.ovf.u8", Base, InlineNone, "Convert to an unsigned int64 (on the stack as int64) and throw an exception on overflow."),
    one(0xC2, "refanyval", ObjectModel, InlineType, "Push the address stored in a typed reference."),
    one(0xC3, "ckfinite", Base, InlineNone, "Throw ArithmeticException if value is not a finite number."),
    one(0xC6, "mkrefany", ObjectModel, InlineType, "Push a typed reference to ptr of type class onto the stack."),
    one(0xD0, "ldtoken", ObjectModel, InlineTok, "Convert metadata token to its runtime representation."),
    one(0xD1, "conv.u2", Base, InlineNone, "Convert to unsigned int16, pushing int32 on stack."),
    one(0xD2, "conv.u1", Base, InlineNone, "Convert to unsigned int8, pushing int32 on stack."),
    one(0xD3, "conv.i", Base, InlineNone, "Convert to native int, pushing native int on stack."),
    one(0xD4, "conv.ovf.i", Base, InlineNone, "Convert to a native int (on the stack as native int) and throw an exception on overflow."),
    one(0xD5, "conv.ovf.u", Base, InlineNone, "Convert to a native unsigned int (on the stack as native int) and throw an exception on overflow."),
    one(0xD6, "add.ovf", Base, InlineNone, "Add signed integer values with overflow check."),
    one(0xD7, "add.ovf.un", Base, InlineNone, "Add unsigned integer values with overflow check."),
    one(0xD8, "mul.ovf", Base, InlineNone, "Multiply signed integer values. Signed result shall fit in same size"),
    one(0xD9, "mul.ovf.un", Base, InlineNone, "Multiply unsigned integer values. Unsigned result shall fit in same size"),
    one(0xDA, "sub.ovf", Base, InlineNone, "Subtract native int from a native int. Signed result shall fit in same size"),
    one(0xDB, "sub.ovf.un", Base, InlineNone, "Subtract native unsigned int from a native unsigned int. Unsigned result shall fit in same size."),
    one(0xDC, "endfinally", Base, InlineNone, "End finally clause of an exception block."),
    one(0xDD, "leave", Base, InlineBrTarget, "Exit a protected region of code."),
    one(0xDE, "leave.s", Base, ShortInlineBrTarget, "Exit a protected region of code, short form."),
    one(0xDF, "stind.i", Base, InlineNone, "Store value of type native int into memory at address"),
    one(0xE0, "conv.u", Base, InlineNone, "Convert to native unsigned int, pushing native int on stack."),
    two(0x00, "arglist", Base, InlineNone, "Return argument list handle for the current method."),
    two(0x01, "ceq", Base, InlineNone, "Push 1 (of type int32) if value1 equals value2, else push 0."),
    two(0x02, "cgt", Base, InlineNone, "Push 1 (of type int32) if value1 > value2, else push 0."),
    two(0x03, "cgt.un", Base, InlineNone, "Push 1 (of type int32) if value1 > value2, unsigned or unordered, else push 0."),
    two(0x04, "clt", Base, InlineNone, "Push 1 (of type int32) if value1 < value2, else push 0."),
    two(0x05, "clt.un", Base, InlineNone, "Push 1 (of type int32) if value1 < value2, unsigned or unordered, else push 0."),
    two(0x06, "ldftn", Base, InlineMethod, "Push a pointer to a method referenced by method, on the stack."),
    two(0x07, "ldvirtftn", ObjectModel, InlineMethod, "Push address of virtual method on the stack."),
    // ldarg is fe 08 here, matching existing tooling. fe 09 is unassigned.
    two(0x08, "ldarg", Base, InlineVar, "Load argument numbered num onto the stack."),
    two(0x0A, "ldarga", Base, InlineVar, "Fetch the address of argument argNum."),
    two(0x0B, "starg", Base, InlineVar, "Store value to the argument numbered num."),
    two(0x0C, "ldloc", Base, InlineVar, "Load local variable of index indx onto stack."),
    two(0x0D, "ldloca", Base, InlineVar, "Load address of local variable with index indx."),
    two(0x0E, "stloc", Base, InlineVar, "Pop a value from stack into local variable indx."),
    two(0x0F, "localloc", Base, InlineNone, "Allocate space from the local memory pool."),
    two(0x11, "endfilter", Base, InlineNone, "End an exception handling filter clause."),
    two(0x12, "unaligned.", Prefix, ShortInlineI, "Subsequent pointer instruction might be unaligned."),
    two(0x13, "volatile.", Prefix, InlineNone, "Subsequent pointer reference is volatile."),
    two(0x14, "tail.", Prefix, InlineNone, "Subsequent call terminates current method"),
    two(0x15, "initobj", ObjectModel, InlineType, "Initialize the value at address dest."),
    two(0x16, "constrained.", Prefix, InlineType, "Call a virtual method on a type constrained to be type T"),
    two(0x17, "cpblk", Base, InlineNone, "Copy data from memory to memory."),
    two(0x18, "initblk", Base, InlineNone, "Set all bytes in a block of memory to a given byte value."),
    two(0x19, "no.", Prefix, InlineNone, "The specified fault check(s) normally performed as part of the execution of the subsequent instruction can/shall be skipped."),
    two(0x1A, "rethrow", ObjectModel, InlineNone, "Rethrow the current exception."),
    two(0x1C, "sizeof", ObjectModel, InlineType, "Push the size, in bytes, of a type as an unsigned int32."),
    two(0x1D, "refanytype", ObjectModel, InlineNone, "Push the type token stored in a typed reference."),
    two(0x1E, "readonly.", Prefix, InlineNone, "Specify that the subsequent array address operation performs no type check at runtime, and that it returns a controlled-mutability managed pointer"),
];

static OPCODES: [OpcodeInfo; CATALOG.len()] = CATALOG;

const ABSENT: u8 = u8::MAX;

const _: () = assert!(CATALOG.len() < ABSENT as usize);

/// Maps a byte to its index in the catalog, for either the single-byte
/// namespace or the namespace behind the escape byte.
const fn build_index(two_byte: bool) -> [u8; 256] {
    let mut index = [ABSENT; 256];
    let mut i = 0;
    while i < CATALOG.len() {
        let id = CATALOG[i].id;
        if id.is_two_byte() == two_byte {
            let key = match id.second() {
                Some(second) => {
                    assert!(id.first() == TWO_BYTE_ESCAPE);
                    second
                }
                None => {
                    assert!(id.first() != TWO_BYTE_ESCAPE);
                    id.first()
                }
            };
            assert!(index[key as usize] == ABSENT, "duplicate opcode");
            index[key as usize] = i as u8;
        }
        i += 1;
    }
    index
}

static SINGLE_BYTE_INDEX: [u8; 256] = build_index(false);
static TWO_BYTE_INDEX: [u8; 256] = build_index(true);

/// How a byte behaves at the start of an instruction.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LeadByte {
    /// A complete single-byte opcode.
    SingleByte,
    /// The two-byte escape; a second byte completes the opcode.
    Escape,
    /// Not the start of any opcode.
    Invalid,
}

/// Classify `byte` as the first byte of an instruction.
#[inline]
pub fn classify_lead_byte(byte: u8) -> LeadByte {
    if byte == TWO_BYTE_ESCAPE {
        LeadByte::Escape
    } else if SINGLE_BYTE_INDEX[byte as usize] != ABSENT {
        LeadByte::SingleByte
    } else {
        LeadByte::Invalid
    }
}

/// True if some opcode starts with `byte`, including the two-byte escape.
#[inline]
pub fn is_valid_lead_byte(byte: u8) -> bool {
    classify_lead_byte(byte) != LeadByte::Invalid
}

/// True if `byte` completes some two-byte opcode after the escape byte.
#[inline]
pub fn is_valid_second_byte(byte: u8) -> bool {
    TWO_BYTE_INDEX[byte as usize] != ABSENT
}

/// Exact catalog lookup.
pub fn lookup(id: OpcodeId) -> Option<&'static OpcodeInfo> {
    let slot = match id.second() {
        None => SINGLE_BYTE_INDEX[id.first() as usize],
        Some(second) if id.first() == TWO_BYTE_ESCAPE => TWO_BYTE_INDEX[second as usize],
        Some(_) => ABSENT,
    };
    if slot == ABSENT {
        None
    } else {
        Some(&OPCODES[slot as usize])
    }
}

/// Find an opcode by mnemonic. Trailing whitespace in cataloged mnemonics is
/// ignored, so `"beq.s"` finds the `"beq.s "` entry.
pub fn lookup_mnemonic(mnemonic: &str) -> Option<&'static OpcodeInfo> {
    OPCODES
        .iter()
        .find(|info| info.mnemonic.trim_end() == mnemonic)
}

/// Every cataloged opcode, single-byte opcodes first, each namespace in
/// ascending byte order.
pub fn opcode_table() -> impl ExactSizeIterator<Item = &'static OpcodeInfo> {
    OPCODES.iter()
}

/// Number of cataloged opcodes.
#[inline]
pub const fn opcode_count() -> usize {
    CATALOG.len()
}
