//! The closed set of validation record kinds.
//!
//! Every kind is declared once in the table at the bottom of this file. The table generates
//! the stable kind tags, the record enum, operand rewriting (handles to IDs), the wire field
//! order, and the human readable rendering. Ordering is derived: the variant (declared in tag
//! order) is the primary key and the fields, in declaration order, break ties.

use std::fmt;

use crate::cache::error::CodecError;
use crate::cache::wire::{WireField, WireReader, WireWriter};
use crate::runtime::{ChainDigest, ProcRef, Symbol, TypeRef};

use super::id::SymbolId;

/// What a record establishes about its operands.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum RecordClass {
    /// Derives a type symbol from already validated operands.
    Type,
    /// Derives a procedure symbol from already validated operands.
    Procedure,
    /// Re-checks a property of operands that are all already validated.
    Check,
}

/// A record operand in either position.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Operand<T, P> {
    Type(T),
    Procedure(P),
}

impl Operand<&TypeRef, &ProcRef> {
    pub fn symbol(self) -> Symbol {
        match self {
            Operand::Type(ty) => Symbol::Type(*ty),
            Operand::Procedure(proc) => Symbol::Procedure(*proc),
        }
    }
}

/// Record as it leaves the compiler: every operand replaced by its ID.
pub type PersistedRecord = ValidationRecord<SymbolId, SymbolId>;

macro_rules! defined_operand {
    (Type; [$head:ident $(, $rest:ident)*]; [$($proc:ident),*]) => {
        Some(Operand::Type($head))
    };
    (Procedure; [$($ty:ident),*]; [$head:ident $(, $rest:ident)*]) => {
        Some(Operand::Procedure($head))
    };
    (Check; [$($ty:ident),*]; [$($proc:ident),*]) => {
        None
    };
}

macro_rules! validation_records {
    (
        $(
            $(#[$doc:meta])*
            $tag:literal => $variant:ident ($class:ident) {
                types: [$($ty_field:ident),*],
                procs: [$($proc_field:ident),*],
                data: [$($data_field:ident : $data_ty:ty),*] $(,)?
            }
        ),* $(,)?
    ) => {
        /// Stable tag of each record kind. The numeric values are part of the persisted format.
        #[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
        #[repr(u8)]
        pub enum RecordKind {
            $($variant = $tag,)*
        }

        impl RecordKind {
            pub const ALL: &'static [RecordKind] = &[$(RecordKind::$variant,)*];

            pub fn tag(self) -> u8 {
                self as u8
            }

            pub fn from_tag(tag: u8) -> Option<Self> {
                match tag {
                    $($tag => Some(RecordKind::$variant),)*
                    _ => None,
                }
            }

            pub fn name(self) -> &'static str {
                match self {
                    $(RecordKind::$variant => stringify!($variant),)*
                }
            }

            pub fn class(self) -> RecordClass {
                match self {
                    $(RecordKind::$variant => RecordClass::$class,)*
                }
            }
        }

        #[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
        pub enum ValidationRecord<T = TypeRef, P = ProcRef> {
            $(
                $(#[$doc])*
                $variant {
                    $($ty_field: T,)*
                    $($proc_field: P,)*
                    $($data_field: $data_ty,)*
                },
            )*
        }

        impl<T, P> ValidationRecord<T, P> {
            pub fn kind(&self) -> RecordKind {
                match self {
                    $(ValidationRecord::$variant { .. } => RecordKind::$variant,)*
                }
            }

            /// The operand this record introduces, if it derives a symbol at all.
            #[allow(unused_variables)]
            pub fn defined_operand(&self) -> Option<Operand<&T, &P>> {
                match self {
                    $(
                        ValidationRecord::$variant { $($ty_field,)* $($proc_field,)* .. } => {
                            defined_operand!($class; [$($ty_field),*]; [$($proc_field),*])
                        }
                    )*
                }
            }

            /// Every symbol operand, types first, in declaration order.
            pub fn operands(&self) -> Vec<Operand<&T, &P>> {
                match self {
                    $(
                        ValidationRecord::$variant { $($ty_field,)* $($proc_field,)* .. } => {
                            vec![$(Operand::Type($ty_field),)* $(Operand::Procedure($proc_field),)*]
                        }
                    )*
                }
            }

            /// Rewrites every symbol operand, keeping auxiliary data untouched.
            pub fn try_map_operands<T2, P2, E>(
                &self,
                mut map_type: impl FnMut(&T) -> Result<T2, E>,
                mut map_proc: impl FnMut(&P) -> Result<P2, E>,
            ) -> Result<ValidationRecord<T2, P2>, E> {
                Ok(match self {
                    $(
                        ValidationRecord::$variant { $($ty_field,)* $($proc_field,)* $($data_field,)* } => {
                            ValidationRecord::$variant {
                                $($ty_field: map_type($ty_field)?,)*
                                $($proc_field: map_proc($proc_field)?,)*
                                $($data_field: $data_field.clone(),)*
                            }
                        }
                    )*
                })
            }
        }

        impl<T: WireField, P: WireField> ValidationRecord<T, P> {
            pub(crate) fn write_fields(&self, writer: &mut WireWriter) {
                match self {
                    $(
                        ValidationRecord::$variant { $($ty_field,)* $($proc_field,)* $($data_field,)* } => {
                            $($ty_field.write(writer);)*
                            $($proc_field.write(writer);)*
                            $($data_field.write(writer);)*
                        }
                    )*
                }
            }

            pub(crate) fn read_fields(
                kind: RecordKind,
                reader: &mut WireReader<'_>,
            ) -> Result<Self, CodecError> {
                Ok(match kind {
                    $(
                        RecordKind::$variant => ValidationRecord::$variant {
                            $($ty_field: T::read(reader)?,)*
                            $($proc_field: P::read(reader)?,)*
                            $($data_field: <$data_ty as WireField>::read(reader)?,)*
                        },
                    )*
                })
            }
        }

        impl<T: fmt::Display, P: fmt::Display> fmt::Display for ValidationRecord<T, P> {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                match self {
                    $(
                        ValidationRecord::$variant { $($ty_field,)* $($proc_field,)* $($data_field,)* } => {
                            f.write_str(stringify!($variant))?;
                            let mut sep = " {";
                            $(
                                write!(f, "{sep} {}={}", stringify!($ty_field), $ty_field)?;
                                sep = ",";
                            )*
                            $(
                                write!(f, "{sep} {}={}", stringify!($proc_field), $proc_field)?;
                                sep = ",";
                            )*
                            $(
                                write!(f, "{sep} {}={}", stringify!($data_field), $data_field)?;
                                sep = ",";
                            )*
                            if sep == "," {
                                f.write_str(" }")?;
                            }
                            Ok(())
                        }
                    )*
                }
            }
        }
    };
}

impl<T, P> ValidationRecord<T, P> {
    pub fn class(&self) -> RecordClass {
        self.kind().class()
    }

    /// Type records feed the array-dimension bookkeeping; procedure records and checks do not.
    pub fn is_type_record(&self) -> bool {
        self.class() == RecordClass::Type
    }
}

impl<T: Ord, P: Ord> ValidationRecord<T, P> {
    pub fn is_less_than(&self, other: &Self) -> bool {
        self < other
    }

    pub fn is_equal(&self, other: &Self) -> bool {
        !self.is_less_than(other) && !other.is_less_than(self)
    }
}

impl ValidationRecord {
    pub fn defined_symbol(&self) -> Option<Symbol> {
        self.defined_operand().map(|operand| operand.symbol())
    }

    pub fn symbols(&self) -> impl Iterator<Item = Symbol> + '_ {
        self.operands().into_iter().map(|operand| operand.symbol())
    }
}

validation_records! {
    /// `ty` is what `name` resolves to from `beholder`'s naming context.
    1 => TypeByName (Type) {
        types: [ty, beholder],
        procs: [],
        data: [name: String],
    },
    /// `ty` was observed through profiling and is re-found by name and shape.
    2 => ProfiledType (Type) {
        types: [ty],
        procs: [],
        data: [name: String, chain: ChainDigest],
    },
    /// `ty` is the type named by entry `index` of `beholder`'s symbol table.
    3 => TypeFromEntry (Type) {
        types: [ty, beholder],
        procs: [],
        data: [index: u32],
    },
    /// `ty` declares the field entry `index` of `beholder` refers to.
    4 => DefiningTypeFromEntry (Type) {
        types: [ty, beholder],
        procs: [],
        data: [index: u32, is_static: bool],
    },
    /// `ty` holds the static storage or code entry `index` of `beholder` refers to.
    5 => StaticTypeFromEntry (Type) {
        types: [ty, beholder],
        procs: [],
        data: [index: u32],
    },
    6 => TypeFromProcedure (Type) {
        types: [ty],
        procs: [procedure],
        data: [],
    },
    7 => ComponentTypeFromArray (Type) {
        types: [component, array],
        procs: [],
        data: [],
    },
    8 => ArrayTypeFromComponent (Type) {
        types: [array, component],
        procs: [],
        data: [],
    },
    9 => SuperTypeFromType (Type) {
        types: [super_type, child],
        procs: [],
        data: [],
    },
    /// Outcome of an instance-of test; the fixedness flags are part of the fact.
    10 => TypeInstanceOfType (Check) {
        types: [object, cast],
        procs: [],
        data: [object_fixed: bool, cast_fixed: bool, is_instance: bool],
    },
    11 => SystemTypeByName (Type) {
        types: [ty],
        procs: [],
        data: [name: String],
    },
    /// `ty` is the interface named by the interface-procedure entry `index` of `beholder`.
    12 => TypeFromDispatchEntry (Type) {
        types: [ty, beholder],
        procs: [],
        data: [index: u32],
    },
    13 => DeclaringTypeFromField (Type) {
        types: [ty, beholder],
        procs: [],
        data: [index: u32],
    },
    14 => MetaTypeFromType (Type) {
        types: [meta, object],
        procs: [],
        data: [],
    },
    /// Speculative: `child` is the only concrete subtype of `super_type`.
    15 => ConcreteSubtypeFromType (Type) {
        types: [child, super_type],
        procs: [],
        data: [],
    },
    /// Shape check emitted for every non-array type the first time it gets an ID.
    16 => TypeChain (Check) {
        types: [ty],
        procs: [],
        data: [chain: ChainDigest],
    },
    /// `procedure` is the `index`-th procedure declared by `beholder`.
    17 => ProcedureFromType (Procedure) {
        types: [beholder],
        procs: [procedure],
        data: [index: u32],
    },
    18 => StaticProcedureFromEntry (Procedure) {
        types: [beholder],
        procs: [procedure],
        data: [index: u32],
    },
    19 => SpecialProcedureFromEntry (Procedure) {
        types: [beholder],
        procs: [procedure],
        data: [index: u32],
    },
    20 => VirtualProcedureFromEntry (Procedure) {
        types: [beholder],
        procs: [procedure],
        data: [index: u32],
    },
    /// `procedure` occupies dispatch slot `offset` of `beholder`.
    21 => VirtualProcedureFromOffset (Procedure) {
        types: [beholder],
        procs: [procedure],
        data: [offset: i32, ignore_rt_resolve: bool],
    },
    22 => InterfaceProcedureFromEntry (Procedure) {
        types: [beholder, lookup],
        procs: [procedure],
        data: [index: u32],
    },
    /// An interface call site that actually binds to a procedure of a class.
    23 => ImproperInterfaceProcedureFromEntry (Procedure) {
        types: [beholder],
        procs: [procedure],
        data: [index: u32],
    },
    24 => ProcedureFromTypeAndSignature (Procedure) {
        types: [owner, beholder],
        procs: [procedure],
        data: [name: String, signature: String],
    },
    25 => StackWalkerMaySkipFrames (Check) {
        types: [owner],
        procs: [procedure],
        data: [skip_frames: bool],
    },
    26 => TypeInitialization (Check) {
        types: [ty],
        procs: [],
        data: [is_initialized: bool],
    },
    /// Speculative: every concrete subtype of `this_type` dispatches slot `slot` to `procedure`.
    27 => ProcedureFromSingleImplementer (Procedure) {
        types: [this_type],
        procs: [procedure, caller],
        data: [slot: u32],
    },
    /// Speculative: `procedure` is the only implementation of the interface call at entry
    /// `index` of the caller's type.
    28 => ProcedureFromSingleInterfaceImplementer (Procedure) {
        types: [this_type],
        procs: [procedure, caller],
        data: [index: u32],
    },
    29 => ProcedureFromSingleAbstractImplementer (Procedure) {
        types: [this_type],
        procs: [procedure, caller],
        data: [slot: u32],
    },
}
