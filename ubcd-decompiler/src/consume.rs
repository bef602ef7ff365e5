//! Operand layouts per instruction kind.

use ubcd_ir::{CallTarget, LabelEntry, Token};
use ubcd_isa::{
    CAST_OBJECT_TO_INTERFACE, DEFAULT_CASE_TARGET, Opcode, VER_ASSERT_DEBUG_MODE,
    VER_DELEGATE_FUNCTION_LOCAL, VER_DELEGATE_PROPERTY_REF, VER_DYNARRAY_PARMS_TERMINATOR,
    VER_NEW_TEMPLATE, VER_STRUCT_MEMBER_FLAGS, VER_STRUCT_MEMBER_STRUCT_REF,
    VER_SWITCH_PROPERTY_REF, VER_UE3_TOKEN_LAYOUT,
};

use crate::error::DecodeError;
use crate::stream::Decoder;

/// Name that terminates a label table.
const LABEL_TABLE_END: &str = "None";
/// Position stored with the terminating entry; used when names are unknown.
const LABEL_TABLE_END_POSITION: u32 = 0xFFFF;

/// Read the operands of an instruction whose opcode was just consumed.
pub(crate) fn consume(d: &mut Decoder<'_>, opcode: Opcode) -> Result<Token, DecodeError> {
    let format = d.format();
    let token = match opcode {
        Opcode::LocalVariable
        | Opcode::InstanceVariable
        | Opcode::DefaultVariable
        | Opcode::StateVariable
        | Opcode::LocalOutVariable
        | Opcode::NativeParm => Token::Variable(d.read_object()?),
        Opcode::UndefinedVariable => Token::UndefinedVariable,
        Opcode::BoolVariable => Token::BoolVariable(d.read_boxed()?),
        Opcode::InstanceDelegate => Token::InstanceDelegate(d.read_name()?),
        Opcode::DelegateProperty => {
            let name = d.read_name()?;
            let property = if format.at_least(VER_DELEGATE_PROPERTY_REF) {
                Some(d.read_object()?)
            } else {
                None
            };
            Token::DelegateProperty { name, property }
        }
        Opcode::DefaultParmValue => {
            let size = d.read_u16()?;
            let statements = d.read_until(Opcode::EndParmValue)?;
            Token::DefaultParmValue { size, statements }
        }

        Opcode::IntConst => Token::IntConst(d.read_i32()?),
        Opcode::FloatConst => Token::FloatConst(d.read_f32()?),
        Opcode::ByteConst | Opcode::IntConstByte => Token::ByteConst(d.read_u8()?),
        Opcode::StringConst => Token::StringConst(d.read_ansi_string()?),
        Opcode::UnicodeStringConst => Token::StringConst(d.read_wide_string()?),
        Opcode::NameConst => Token::NameConst(d.read_name()?),
        Opcode::ObjectConst => Token::ObjectConst(d.read_object()?),
        Opcode::RotatorConst => Token::RotatorConst {
            pitch: d.read_i32()?,
            yaw: d.read_i32()?,
            roll: d.read_i32()?,
        },
        Opcode::VectorConst => Token::VectorConst {
            x: d.read_f32()?,
            y: d.read_f32()?,
            z: d.read_f32()?,
        },
        Opcode::RangeConst => Token::RangeConst {
            min: d.read_f32()?,
            max: d.read_f32()?,
        },

        Opcode::Return => Token::Return(d.read_boxed()?),
        Opcode::ReturnNothing => Token::ReturnNothing(d.read_object()?),
        Opcode::Jump => Token::Jump {
            target: d.read_u16()?,
        },
        Opcode::JumpIfNot => {
            let target = d.read_u16()?;
            let condition = d.read_boxed()?;
            Token::JumpIfNot { target, condition }
        }
        Opcode::FilterEditorOnly => Token::FilterEditorOnly {
            target: d.read_u16()?,
        },
        Opcode::Switch => {
            let property = if format.at_least(VER_SWITCH_PROPERTY_REF) {
                Some(d.read_object()?)
            } else {
                None
            };
            let size = d.read_u8()?;
            let value = d.read_boxed()?;
            Token::Switch {
                property,
                size,
                value,
            }
        }
        Opcode::Case => {
            let target = d.read_u16()?;
            let value = if target != DEFAULT_CASE_TARGET {
                Some(d.read_boxed()?)
            } else {
                None
            };
            Token::Case { target, value }
        }
        Opcode::Iterator => {
            let expr = d.read_boxed()?;
            let end = d.read_u16()?;
            Token::Iterator { expr, end }
        }
        Opcode::DynArrayIterator => {
            let array = d.read_boxed()?;
            let item = d.read_boxed()?;
            let with_index = d.read_u8()? != 0;
            let index = d.read_boxed()?;
            let end = d.read_u16()?;
            Token::DynArrayIterator {
                array,
                item,
                with_index,
                index,
                end,
            }
        }
        Opcode::GotoLabel => Token::GotoLabel(d.read_boxed()?),
        Opcode::LabelTable => {
            let mut entries = Vec::new();
            loop {
                let name = d.read_name()?;
                let position = d.read_u32()?;
                let end = match d.symbols.name(name) {
                    Some(text) => text == LABEL_TABLE_END,
                    None => position == LABEL_TABLE_END_POSITION,
                };
                if end {
                    break;
                }
                entries.push(LabelEntry { name, position });
            }
            Token::LabelTable(entries)
        }
        Opcode::Assert => {
            let line = d.read_u16()?;
            let debug_mode = if format.at_least(VER_ASSERT_DEBUG_MODE) {
                Some(d.read_u8()?)
            } else {
                None
            };
            let condition = d.read_boxed()?;
            Token::Assert {
                line,
                debug_mode,
                condition,
            }
        }
        Opcode::DebugInfo => Token::DebugInfo {
            version: d.read_i32()?,
            line: d.read_i32()?,
            column: d.read_i32()?,
            mode: d.read_u8()?,
        },

        Opcode::Let | Opcode::LetBool | Opcode::LetDelegate => {
            let target = d.read_boxed()?;
            let value = d.read_boxed()?;
            Token::Let { target, value }
        }
        Opcode::EatReturnValue => {
            let property = d.read_object()?;
            let expr = d.read_boxed()?;
            Token::EatReturnValue { property, expr }
        }
        Opcode::Skip => {
            let size = d.read_u16()?;
            let expr = d.read_boxed()?;
            Token::Skip { size, expr }
        }

        Opcode::Context | Opcode::ClassContext => {
            let object = d.read_boxed()?;
            let skip = d.read_u16()?;
            let field = if format.at_least(VER_UE3_TOKEN_LAYOUT) {
                Some(d.read_object()?)
            } else {
                None
            };
            let field_size = d.read_u8()?;
            let member = d.read_boxed()?;
            Token::Context {
                object,
                skip,
                field,
                field_size,
                member,
            }
        }
        Opcode::InterfaceContext => Token::InterfaceContext(d.read_boxed()?),
        Opcode::StructMember => {
            let property = d.read_object()?;
            let struct_ref = if format.at_least(VER_STRUCT_MEMBER_STRUCT_REF) {
                Some(d.read_object()?)
            } else {
                None
            };
            let flags = if format.at_least(VER_STRUCT_MEMBER_FLAGS) {
                Some([d.read_u8()?, d.read_u8()?])
            } else {
                None
            };
            let object = d.read_boxed()?;
            Token::StructMember {
                property,
                struct_ref,
                flags,
                object,
            }
        }
        Opcode::ArrayElement | Opcode::DynArrayElement => {
            let index = d.read_boxed()?;
            let array = d.read_boxed()?;
            Token::ArrayElement { index, array }
        }
        Opcode::DynArrayLength => Token::DynArrayLength(d.read_boxed()?),
        Opcode::DynArrayInsert | Opcode::DynArrayRemove | Opcode::DynArrayAdd => {
            let array = d.read_boxed()?;
            let mut args = Vec::new();
            if opcode != Opcode::DynArrayAdd {
                args.push(d.read_expr()?);
            }
            args.push(d.read_expr()?);
            if format.at_least(VER_DYNARRAY_PARMS_TERMINATOR) {
                d.skip_terminator()?;
            }
            Token::DynArrayMethod {
                array,
                skip: None,
                args,
            }
        }
        Opcode::DynArrayAddItem
        | Opcode::DynArrayRemoveItem
        | Opcode::DynArrayInsertItem
        | Opcode::DynArrayFind
        | Opcode::DynArrayFindStruct
        | Opcode::DynArraySort => {
            let array = d.read_boxed()?;
            let skip = d.read_u16()?;
            let args = d.read_until(Opcode::EndFunctionParms)?;
            Token::DynArrayMethod {
                array,
                skip: Some(skip),
                args,
            }
        }

        Opcode::VirtualFunction => {
            let name = d.read_name()?;
            call(d, CallTarget::Virtual(name))?
        }
        Opcode::FinalFunction => {
            let function = d.read_object()?;
            call(d, CallTarget::Final(function))?
        }
        Opcode::GlobalFunction => {
            let name = d.read_name()?;
            call(d, CallTarget::Global(name))?
        }
        Opcode::DelegateFunction => {
            let local = if format.at_least(VER_DELEGATE_FUNCTION_LOCAL) {
                d.read_u8()? != 0
            } else {
                false
            };
            let property = d.read_object()?;
            let name = d.read_name()?;
            call(
                d,
                CallTarget::Delegate {
                    local,
                    property,
                    name,
                },
            )?
        }
        Opcode::NativeFunction(ordinal) | Opcode::UnresolvedNative(ordinal) => {
            call(d, CallTarget::Native(ordinal))?
        }

        Opcode::PrimitiveCast => {
            let cast = d.read_u8()?;
            let interface = if cast == CAST_OBJECT_TO_INTERFACE
                && format.at_least(VER_UE3_TOKEN_LAYOUT)
            {
                Some(d.read_object()?)
            } else {
                None
            };
            let expr = d.read_boxed()?;
            Token::PrimitiveCast {
                cast,
                interface,
                expr,
            }
        }
        Opcode::LegacyCast(cast) => Token::PrimitiveCast {
            cast,
            interface: None,
            expr: d.read_boxed()?,
        },
        Opcode::DynamicCast | Opcode::MetaCast | Opcode::InterfaceCast => {
            let class = d.read_object()?;
            let expr = d.read_boxed()?;
            Token::ClassCast { class, expr }
        }

        Opcode::StructCmpEq | Opcode::StructCmpNe => {
            let struct_ref = d.read_object()?;
            let lhs = d.read_boxed()?;
            let rhs = d.read_boxed()?;
            Token::StructCmp {
                struct_ref,
                lhs,
                rhs,
            }
        }
        Opcode::EqualEqualDelDel
        | Opcode::NotEqualDelDel
        | Opcode::EqualEqualDelFunc
        | Opcode::NotEqualDelFunc => {
            let lhs = d.read_boxed()?;
            let rhs = d.read_boxed()?;
            d.skip_terminator()?;
            Token::DelegateCmp { lhs, rhs }
        }
        Opcode::Conditional => {
            let condition = d.read_boxed()?;
            let true_skip = d.read_u16()?;
            let then = d.read_boxed()?;
            let false_skip = d.read_u16()?;
            let otherwise = d.read_boxed()?;
            Token::Conditional {
                condition,
                true_skip,
                then,
                false_skip,
                otherwise,
            }
        }
        Opcode::New => {
            let outer = d.read_boxed()?;
            let name = d.read_boxed()?;
            let flags = d.read_boxed()?;
            let class = d.read_boxed()?;
            let template = if format.at_least(VER_NEW_TEMPLATE) {
                Some(d.read_boxed()?)
            } else {
                None
            };
            Token::New {
                outer,
                name,
                flags,
                class,
                template,
            }
        }

        Opcode::IntZero
        | Opcode::IntOne
        | Opcode::True
        | Opcode::False
        | Opcode::NoObject
        | Opcode::SelfObject
        | Opcode::EmptyDelegate
        | Opcode::IteratorNext
        | Opcode::IteratorPop
        | Opcode::Stop
        | Opcode::Nothing
        | Opcode::EndOfScript
        | Opcode::EndFunctionParms
        | Opcode::EndParmValue
        | Opcode::EmptyParmValue => Token::NoOperands,

        Opcode::Unknown(_) => Token::Unknown,
    };
    Ok(token)
}

fn call(d: &mut Decoder<'_>, target: CallTarget) -> Result<Token, DecodeError> {
    let args = d.read_until(Opcode::EndFunctionParms)?;
    Ok(Token::Call { target, args })
}
