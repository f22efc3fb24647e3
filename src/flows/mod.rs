use crate::rpc::RpcRouter;

pub mod dto;
pub mod handlers;
pub mod repo;
pub mod repo_types;

pub fn procedures() -> RpcRouter {
    RpcRouter::new()
        .procedure("flows.createFlow", handlers::create_flow)
        .procedure("flows.getFlow", handlers::get_flow)
        .procedure("flows.listFlows", handlers::list_flows)
        .procedure("flows.updateFlow", handlers::update_flow)
}
