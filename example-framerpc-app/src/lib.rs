use example_framerpc_service_definition::arith::{
    ADD_METHOD, DIV_METHOD, DIVIDE_BY_ZERO, MUL_METHOD, SERVICE_NAME,
};
use example_framerpc_service_definition::{Args, Quotient, Reply};
use framerpc::Context;
use framerpc_tokio_rpc_server::{RegisterError, Service, ServiceBuilder, ServiceError};
use std::sync::Arc;

/// Receiver of the `Arith` service. Holds no state.
pub struct Arith;

impl Arith {
    fn add(&self, _ctx: &Context, args: Args, reply: &mut Reply) -> Result<(), ServiceError> {
        reply.c = args.a + args.b;
        Ok(())
    }

    fn mul(&self, _ctx: &Context, args: Args, reply: &mut Reply) -> Result<(), ServiceError> {
        reply.c = args.a * args.b;
        Ok(())
    }
}

async fn div(_arith: Arc<Arith>, _ctx: Context, args: Args) -> Result<Quotient, ServiceError> {
    if args.b == 0 {
        return Err(DIVIDE_BY_ZERO.into());
    }
    match (args.a.checked_div(args.b), args.a.checked_rem(args.b)) {
        (Some(quo), Some(rem)) => Ok(Quotient { quo, rem }),
        _ => Err(format!("{} / {} overflows", args.a, args.b).into()),
    }
}

/// Builds the `Arith` service with its `Add`, `Mul` and `Div` methods.
pub fn arith_service() -> Result<Service, RegisterError> {
    Ok(ServiceBuilder::named(SERVICE_NAME, Arith)
        .method(ADD_METHOD, Arith::add)?
        .method(MUL_METHOD, Arith::mul)?
        .async_method(DIV_METHOD, div)?
        .build())
}
