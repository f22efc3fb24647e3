use crate::config::VerificationPolicy;
use crate::rpc::RpcRouter;

pub mod dto;
pub mod handlers;
pub mod repo;
pub mod repo_types;
pub mod services;

/// `auth.verify-email` is only served when verification is enforced.
pub fn procedures(policy: VerificationPolicy) -> RpcRouter {
    let rpc = RpcRouter::new()
        .procedure("auth.signup", handlers::signup)
        .procedure("auth.signin", handlers::signin);
    if policy.is_required() {
        rpc.procedure("auth.verify-email", handlers::verify_email)
    } else {
        rpc
    }
}
