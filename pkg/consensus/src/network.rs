use openraft::error::{InstallSnapshotError, RPCError, RaftError};
use openraft::network::{RaftNetwork, RPCOption};
use openraft::raft::{
    AppendEntriesRequest, AppendEntriesResponse, InstallSnapshotRequest, InstallSnapshotResponse,
    VoteRequest, VoteResponse,
};
use openraft::BasicNode;

use crate::rpc::{RaftRpc, RaftRpcResponse};
use crate::types::{NodeId, TypeConfig};

/// Dials peers over plain HTTP, the same transport every other component in
/// this system uses. A peer's raft address (`BasicNode::addr`, `host:port`)
/// is exactly the `host:raft-port` string the config service and the router
/// already traffic in.
#[derive(Clone)]
pub struct HttpNetworkFactory {
    client: reqwest::Client,
}

impl Default for HttpNetworkFactory {
    fn default() -> Self {
        HttpNetworkFactory {
            client: reqwest::Client::new(),
        }
    }
}

pub struct HttpNetwork {
    client: reqwest::Client,
    target_addr: String,
}

impl openraft::RaftNetworkFactory<TypeConfig> for HttpNetworkFactory {
    type Network = HttpNetwork;

    async fn new_client(&mut self, _target: NodeId, node: &BasicNode) -> Self::Network {
        HttpNetwork {
            client: self.client.clone(),
            target_addr: node.addr.clone(),
        }
    }
}

impl HttpNetwork {
    async fn send(&self, rpc: RaftRpc) -> Result<RaftRpcResponse, reqwest::Error> {
        self.client
            .post(format!("http://{}/raft/rpc", self.target_addr))
            .json(&rpc)
            .send()
            .await?
            .json::<RaftRpcResponse>()
            .await
    }
}

impl RaftNetwork<TypeConfig> for HttpNetwork {
    async fn append_entries(
        &mut self,
        rpc: AppendEntriesRequest<TypeConfig>,
        _option: RPCOption,
    ) -> Result<AppendEntriesResponse<NodeId>, RPCError<NodeId, BasicNode, RaftError<NodeId>>> {
        match self.send(RaftRpc::AppendEntries(rpc)).await {
            Ok(RaftRpcResponse::AppendEntries(resp)) => Ok(resp),
            Ok(RaftRpcResponse::Error(msg)) => {
                Err(RPCError::Network(openraft::error::NetworkError::new(
                    &std::io::Error::new(std::io::ErrorKind::Other, msg),
                )))
            }
            Ok(_) => unreachable!("peer answered an append_entries call with a different RPC kind"),
            Err(e) => Err(RPCError::Network(openraft::error::NetworkError::new(&e))),
        }
    }

    async fn install_snapshot(
        &mut self,
        rpc: InstallSnapshotRequest<TypeConfig>,
        _option: RPCOption,
    ) -> Result<
        InstallSnapshotResponse<NodeId>,
        RPCError<NodeId, BasicNode, RaftError<NodeId, InstallSnapshotError>>,
    > {
        match self.send(RaftRpc::InstallSnapshot(rpc)).await {
            Ok(RaftRpcResponse::InstallSnapshot(resp)) => Ok(resp),
            Ok(RaftRpcResponse::Error(msg)) => {
                Err(RPCError::Network(openraft::error::NetworkError::new(
                    &std::io::Error::new(std::io::ErrorKind::Other, msg),
                )))
            }
            Ok(_) => unreachable!("peer answered an install_snapshot call with a different RPC kind"),
            Err(e) => Err(RPCError::Network(openraft::error::NetworkError::new(&e))),
        }
    }

    async fn vote(
        &mut self,
        rpc: VoteRequest<NodeId>,
        _option: RPCOption,
    ) -> Result<VoteResponse<NodeId>, RPCError<NodeId, BasicNode, RaftError<NodeId>>> {
        match self.send(RaftRpc::Vote(rpc)).await {
            Ok(RaftRpcResponse::Vote(resp)) => Ok(resp),
            Ok(RaftRpcResponse::Error(msg)) => {
                Err(RPCError::Network(openraft::error::NetworkError::new(
                    &std::io::Error::new(std::io::ErrorKind::Other, msg),
                )))
            }
            Ok(_) => unreachable!("peer answered a vote call with a different RPC kind"),
            Err(e) => Err(RPCError::Network(openraft::error::NetworkError::new(&e))),
        }
    }
}
