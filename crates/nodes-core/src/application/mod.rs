/// Graph store service
pub mod graph_store;
