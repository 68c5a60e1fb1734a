//! Service-discovery agent port, used only by the health check.

#[async_trait::async_trait]
pub trait AgentStatus: Send + Sync + 'static {
    /// Whether the local discovery agent answered its status endpoint.
    async fn agent_alive(&self) -> bool;

    /// Address of the agent, reported verbatim by the health check.
    fn endpoint(&self) -> &str;
}
