/// IR-level types.
///
/// The IR deliberately carries no signedness: an `i32` add is the same
/// instruction whether the frontend saw `int32` or `uint32`. Signedness is a
/// frontend attribute and lives in `crate::ast`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum IrType {
    Void,
    /// Integer of the given bit width. Width 1 doubles as the boolean type.
    Int(u32),
    Fp8,
    Fp16,
    Bf16,
    Fp32,
    Fp64,
    Ptr {
        pointee: Box<IrType>,
        addr_space: u32,
    },
    /// A tile of scalars. Shape entries are always >= 1.
    Block {
        elem: Box<IrType>,
        shape: Vec<u32>,
    },
}

impl IrType {
    pub fn is_void(&self) -> bool {
        matches!(self, IrType::Void)
    }

    pub fn is_block(&self) -> bool {
        matches!(self, IrType::Block { .. })
    }

    pub fn is_ptr(&self) -> bool {
        matches!(self, IrType::Ptr { .. })
    }

    pub fn is_float(&self) -> bool {
        matches!(
            self,
            IrType::Fp8 | IrType::Fp16 | IrType::Bf16 | IrType::Fp32 | IrType::Fp64
        )
    }

    pub fn is_int(&self) -> bool {
        matches!(self, IrType::Int(_))
    }

    /// The scalar element of a block, or the type itself for scalars.
    pub fn scalar(&self) -> &IrType {
        match self {
            IrType::Block { elem, .. } => elem,
            other => other,
        }
    }

    pub fn shape(&self) -> Option<&[u32]> {
        match self {
            IrType::Block { shape, .. } => Some(shape),
            _ => None,
        }
    }

    pub fn pointee(&self) -> Option<&IrType> {
        match self.scalar() {
            IrType::Ptr { pointee, .. } => Some(pointee),
            _ => None,
        }
    }

    /// Lifts `scalar` to a block with this type's shape, or returns `scalar`
    /// unchanged when `self` is not a block.
    pub fn elementwise(&self, scalar: IrType) -> IrType {
        match self {
            IrType::Block { shape, .. } => IrType::Block {
                elem: Box::new(scalar),
                shape: shape.clone(),
            },
            _ => scalar,
        }
    }
}

impl std::fmt::Display for IrType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            IrType::Void => f.write_str("void"),
            IrType::Int(w) => write!(f, "i{}", w),
            IrType::Fp8 => f.write_str("fp8"),
            IrType::Fp16 => f.write_str("fp16"),
            IrType::Bf16 => f.write_str("bf16"),
            IrType::Fp32 => f.write_str("fp32"),
            IrType::Fp64 => f.write_str("fp64"),
            IrType::Ptr { pointee, .. } => write!(f, "{}*", pointee),
            IrType::Block { elem, shape } => {
                write!(f, "{}[", elem)?;
                for (i, d) in shape.iter().enumerate() {
                    if i > 0 {
                        f.write_str("x")?;
                    }
                    write!(f, "{}", d)?;
                }
                f.write_str("]")
            }
        }
    }
}
