mod op_builder;

pub use op_builder::{CursorLocation, OpBuilder};

pub mod test_util {
    use std::sync::Arc;

    use crate::{
        AttrName, Attribute, Context, Dialect, InvariantError, Ir, OpId, OpSpec, OpTrait,
        RegionKind,
    };

    /// Returns a context with two dialects.
    ///
    /// `test` registers `test.op`, the terminators `test.br` and `test.ret`,
    /// `test.graph` (graph regions), `test.no_term` (terminator-free regions)
    /// and `test.checked` (requires exactly one operand). Its attribute hook
    /// requires `test.positive` to be a positive integer.
    ///
    /// `lax` registers nothing and allows unknown operations.
    pub fn test_context() -> Arc<Context> {
        Arc::new(build_test_context())
    }

    pub fn build_test_context() -> Context {
        let mut ctx = Context::new();

        let test = Dialect::new("test").with_attribute_verifier(
            |_: &Ir, _: OpId, name: &AttrName, attr: &Attribute| {
                if name.as_str() != "test.positive" {
                    return Ok(());
                }
                match attr.as_int() {
                    Some(value) if value > 0 => Ok(()),
                    _ => Err(InvariantError::new(format!(
                        "'{name}' expects a positive integer, found {attr}"
                    ))),
                }
            },
        );
        ctx.register_dialect(test).unwrap();
        ctx.register_dialect(Dialect::new("lax").allow_unknown_operations(true))
            .unwrap();

        ctx.register_operation("test.op", OpSpec::new()).unwrap();
        ctx.register_operation("test.br", OpSpec::new().with_trait(OpTrait::IsTerminator))
            .unwrap();
        ctx.register_operation("test.ret", OpSpec::new().with_trait(OpTrait::IsTerminator))
            .unwrap();
        ctx.register_operation(
            "test.graph",
            OpSpec::new().with_region_kinds([RegionKind::Graph, RegionKind::Graph]),
        )
        .unwrap();
        ctx.register_operation(
            "test.no_term",
            OpSpec::new().with_trait(OpTrait::NoTerminator),
        )
        .unwrap();
        ctx.register_operation(
            "test.checked",
            OpSpec::new().with_verifier(|ir, op| {
                let num = ir.op(op).num_operands();
                if num == 1 {
                    Ok(())
                } else {
                    Err(InvariantError::new(format!("expects 1 operand, found {num}"))
                        .with_note("'test.checked' takes a single input"))
                }
            }),
        )
        .unwrap();

        ctx
    }
}
