//! Request dispatch.
//!
//! `handle_request` decodes the fixed header, routes on `ApiKey` to the
//! matching handler, and prefixes the encoded response with the
//! correlation id the client is waiting on. Handlers never see the wire
//! format directly past their own request/response types; everything
//! below that is `protocol::messages`.
//!
//! Only a request this broker doesn't understand at all — an unknown
//! `ApiKey`, or a version outside the advertised range — produces a true
//! `Err`. Every recognized request gets a well-formed response, with
//! failures riding inside it as an `ErrorCode`.

use std::sync::Arc;
use std::time::Instant;

use thiserror::Error;
use tracing::instrument;

use crate::backend::Backend;
use crate::batch::BatchAggregator;
use crate::group::{ConsumerGroupCoordinator, GroupError};
use crate::produce_waiter::ProduceWaiter;
use crate::producer_id::ProducerIdManager;
use crate::protocol::api_key::ApiKey;
use crate::protocol::error_code::ErrorCode;
use crate::protocol::api_version::ApiVersion;
use crate::protocol::messages::add_offsets_to_txn::{AddOffsetsToTxnRequest, AddOffsetsToTxnResponse};
use crate::protocol::messages::add_partitions_to_txn::{
    AddPartitionsToTxnPartitionResult, AddPartitionsToTxnRequest, AddPartitionsToTxnResponse,
    AddPartitionsToTxnTopicResult,
};
use crate::protocol::messages::api_versions::{
    ApiVersionsRequest, ApiVersionsResponse, ApiVersionsResponseApiKey,
};
use crate::protocol::messages::consumer_group::ConsumerGroupMemberMetadata;
use crate::protocol::messages::create_topics::{
    CreateTopicResponse, CreateTopicsRequest, CreateTopicsResponse,
};
use crate::protocol::messages::delete_topics::{
    DeleteTopicsRequest, DeleteTopicsResponse, DeleteTopicsResponseTopic,
};
use crate::protocol::messages::describe_groups::{
    DescribeGroupsRequest, DescribeGroupsResponse, DescribeGroupsResponseGroup,
    DescribeGroupsResponseGroupMember,
};
use crate::protocol::messages::end_txn::{EndTxnRequest, EndTxnResponse};
use crate::protocol::messages::fetch::{FetchRequest, FetchResponse, FetchResponsePartition, FetchResponseTopic};
use crate::protocol::messages::find_coordinator::{FindCoordinatorRequest, FindCoordinatorResponse};
use crate::protocol::messages::header::{RequestHeader, ResponseHeader};
use crate::protocol::messages::heartbeat::{HeartbeatRequest, HeartbeatResponse};
use crate::protocol::messages::init_producer_id::{InitProducerIdRequest, InitProducerIdResponse};
use crate::protocol::messages::join_group::{
    JoinGroupRequest, JoinGroupResponse, JoinGroupResponseMember,
};
use crate::protocol::messages::leave_group::{LeaveGroupRequest, LeaveGroupResponse};
use crate::protocol::messages::list_groups::{ListGroupsRequest, ListGroupsResponse, ListGroupsResponseGroup};
use crate::protocol::messages::list_offsets::{
    ListOffsetsRequest, ListOffsetsResponse, ListOffsetsResponsePartition, ListOffsetsResponseTopic,
};
use crate::protocol::messages::metadata::{
    MetadataRequest, MetadataResponse, MetadataResponseBroker, MetadataResponsePartition,
    MetadataResponseTopic,
};
use crate::protocol::messages::offset_commit::{
    OffsetCommitRequest, OffsetCommitResponse, PartitionCommitResult, TopicCommitResult,
};
use crate::protocol::messages::offset_fetch::{
    OffsetFetchRequest, OffsetFetchResponse, OffsetFetchResponseTopic,
    OffsetFetchResponseTopicPartition,
};
use crate::protocol::messages::produce::{ProduceRequest, ProduceResponse, ProduceResponsePartition, ProduceResponseTopic};
use crate::protocol::messages::sync_group::{SyncGroupRequest, SyncGroupResponse};
use crate::protocol::messages::txn_offset_commit::{
    TxnOffsetCommitRequest, TxnOffsetCommitResponse, TxnOffsetCommitResponsePartition,
    TxnOffsetCommitResponseTopic,
};
use crate::protocol::messages::write_txn_markers::{
    WritableTxnMarkerResult, WriteTxnMarkersPartitionResult, WriteTxnMarkersRequest,
    WriteTxnMarkersResponse, WriteTxnMarkersTopicResult,
};
use crate::protocol::messages::{
    ReadVersionedError, ReadVersionedType, RequestBody, WriteVersionedError, WriteVersionedType,
};
use crate::protocol::traits::{ReadError, ReadType, WriteError, WriteType};
use crate::txn::{TopicPartition as TxnTopicPartition, TransactionCoordinator};

/// Cursor a decoded request body is read out of; always a borrow of the
/// frame the transport handed us, never owned.
type RequestCursor<'a> = std::io::Cursor<&'a [u8]>;

/// Everything that can go wrong turning a raw frame into a framed
/// response. Anything else — a request this broker recognizes but can't
/// satisfy — rides back as an `ErrorCode` inside a normal response instead
/// of an `Err` here.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum DispatchError {
    #[error("malformed request header: {0}")]
    Header(#[from] ReadError),

    #[error("unsupported api key: {0:?}")]
    UnsupportedApiKey(ApiKey),

    #[error("api key {api_key:?} does not support version {version}")]
    UnsupportedApiVersion { api_key: ApiKey, version: ApiVersion },

    #[error(transparent)]
    Body(#[from] ReadVersionedError),

    #[error(transparent)]
    Encode(#[from] WriteVersionedError),

    #[error(transparent)]
    EncodeHeader(#[from] WriteError),

    #[error(transparent)]
    Fetch(#[from] crate::fetch::FetchError),
}

/// Decodes one API's body off `cursor`, invokes `handler`, and encodes the
/// response — checking the request's version against the type's advertised
/// range before attempting to decode it.
macro_rules! dispatch_async {
    ($header:expr, $cursor:expr, $req_ty:ty, $handler:expr) => {{
        let header: &RequestHeader = $header;
        if !<$req_ty as RequestBody>::API_VERSION_RANGE.contains(header.request_api_version) {
            return Err(DispatchError::UnsupportedApiVersion {
                api_key: header.request_api_key,
                version: header.request_api_version,
            });
        }
        let req = <$req_ty as ReadVersionedType<RequestCursor>>::read_versioned(
            $cursor,
            header.request_api_version,
        )?;
        let response = $handler(req).await;
        let mut body = Vec::new();
        response.write_versioned(&mut body, header.request_api_version)?;
        body
    }};
}

/// Same as [`dispatch_async`], for the handlers that never await anything.
macro_rules! dispatch_sync {
    ($header:expr, $cursor:expr, $req_ty:ty, $handler:expr) => {{
        let header: &RequestHeader = $header;
        if !<$req_ty as RequestBody>::API_VERSION_RANGE.contains(header.request_api_version) {
            return Err(DispatchError::UnsupportedApiVersion {
                api_key: header.request_api_key,
                version: header.request_api_version,
            });
        }
        let req = <$req_ty as ReadVersionedType<RequestCursor>>::read_versioned(
            $cursor,
            header.request_api_version,
        )?;
        let response = $handler(req);
        let mut body = Vec::new();
        response.write_versioned(&mut body, header.request_api_version)?;
        body
    }};
}

/// Every API this broker advertises support for, with its implemented
/// version range. Drives the `ApiVersions` response.
pub fn supported_api_versions() -> Vec<ApiVersionsResponseApiKey> {
    use crate::protocol::api_version::ApiVersion;
    let table: &[(ApiKey, i16, i16)] = &[
        (ApiKey::Produce, 0, 9),
        (ApiKey::Fetch, 0, 11),
        (ApiKey::ListOffsets, 0, 5),
        (ApiKey::Metadata, 0, 9),
        (ApiKey::OffsetCommit, 0, 8),
        (ApiKey::OffsetFetch, 0, 7),
        (ApiKey::FindCoordinator, 0, 3),
        (ApiKey::JoinGroup, 0, 5),
        (ApiKey::Heartbeat, 0, 4),
        (ApiKey::LeaveGroup, 0, 4),
        (ApiKey::SyncGroup, 0, 5),
        (ApiKey::DescribeGroups, 0, 4),
        (ApiKey::ListGroups, 0, 4),
        (ApiKey::ApiVersions, 0, 3),
        (ApiKey::CreateTopics, 0, 5),
        (ApiKey::DeleteTopics, 0, 4),
        (ApiKey::DeleteRecords, 0, 2),
        (ApiKey::InitProducerId, 0, 4),
        (ApiKey::AddPartitionsToTxn, 0, 3),
        (ApiKey::AddOffsetsToTxn, 0, 3),
        (ApiKey::EndTxn, 0, 3),
        (ApiKey::WriteTxnMarkers, 0, 1),
        (ApiKey::TxnOffsetCommit, 0, 3),
    ];
    table
        .iter()
        .map(|&(api_key, min, max)| ApiVersionsResponseApiKey {
            api_key,
            min_version: ApiVersion(min),
            max_version: ApiVersion(max),
        })
        .collect()
}

/// Owns every broker-core component and routes requests to them.
pub struct Dispatcher {
    pub backend: Arc<dyn Backend>,
    pub producer_ids: Arc<ProducerIdManager>,
    pub txn_coordinator: Arc<TransactionCoordinator>,
    pub produce_waiter: Arc<ProduceWaiter>,
    pub groups: Arc<ConsumerGroupCoordinator>,
    pub batches: Arc<BatchAggregator>,
    pub default_ack_timeout_ms: u64,

    /// This broker's own node id and advertised address, used to answer
    /// `Metadata` and `FindCoordinator` — both the group and transaction
    /// coordinator are colocated with the broker itself.
    pub broker_id: i32,
    pub host: String,
    pub port: i32,

    /// Forwarded to [`crate::fetch::record_replica_fetch`] on every
    /// follower `Fetch`.
    pub replica_lag_max_messages: i64,

    /// `acks=-1` with fewer ISR members than this fails fast with
    /// `NotEnoughReplicas` instead of waiting out the produce timeout.
    pub min_insync_replicas: i32,
}

impl Dispatcher {
    #[instrument(skip(self))]
    pub fn handle_api_versions(&self, _req: ApiVersionsRequest) -> ApiVersionsResponse {
        ApiVersionsResponse {
            error_code: None,
            api_keys: supported_api_versions(),
            throttle_time_ms: Some(0),
        }
    }

    /// Decodes the fixed header off `input`, routes on `ApiKey` to the
    /// matching handler, and returns a frame of `correlationID ++ body`
    /// ready to length-prefix onto the wire.
    ///
    /// `Fetch` goes through here too; its `records` field always comes
    /// back empty, since a zero-copy caller wants [`Self::handle_fetch_zero_copy`]
    /// instead.
    #[instrument(skip(self, input))]
    pub async fn handle_request(&self, input: &[u8]) -> Result<Vec<u8>, DispatchError> {
        let mut cursor: RequestCursor = std::io::Cursor::new(input);
        let header = RequestHeader::read(&mut cursor)?;

        let body = match header.request_api_key {
            ApiKey::Produce => dispatch_async!(&header, &mut cursor, ProduceRequest, |r| self
                .handle_produce(r)),
            ApiKey::Fetch => dispatch_async!(&header, &mut cursor, FetchRequest, |r| self.handle_fetch(r)),
            ApiKey::ListOffsets => {
                dispatch_async!(&header, &mut cursor, ListOffsetsRequest, |r| self
                    .handle_list_offsets(r))
            }
            ApiKey::Metadata => {
                dispatch_async!(&header, &mut cursor, MetadataRequest, |r| self.handle_metadata(r))
            }
            ApiKey::OffsetCommit => {
                dispatch_async!(&header, &mut cursor, OffsetCommitRequest, |r| self
                    .handle_offset_commit(r))
            }
            ApiKey::OffsetFetch => {
                dispatch_async!(&header, &mut cursor, OffsetFetchRequest, |r| self
                    .handle_offset_fetch(r))
            }
            ApiKey::FindCoordinator => {
                dispatch_sync!(&header, &mut cursor, FindCoordinatorRequest, |r| self
                    .handle_find_coordinator(r))
            }
            ApiKey::JoinGroup => {
                dispatch_async!(&header, &mut cursor, JoinGroupRequest, |r| self.handle_join_group(r))
            }
            ApiKey::Heartbeat => {
                dispatch_async!(&header, &mut cursor, HeartbeatRequest, |r| self.handle_heartbeat(r))
            }
            ApiKey::LeaveGroup => {
                dispatch_async!(&header, &mut cursor, LeaveGroupRequest, |r| self.handle_leave_group(r))
            }
            ApiKey::SyncGroup => {
                dispatch_async!(&header, &mut cursor, SyncGroupRequest, |r| self.handle_sync_group(r))
            }
            ApiKey::DescribeGroups => {
                dispatch_async!(&header, &mut cursor, DescribeGroupsRequest, |r| self
                    .handle_describe_groups(r))
            }
            ApiKey::ListGroups => {
                dispatch_async!(&header, &mut cursor, ListGroupsRequest, |r| self.handle_list_groups(r))
            }
            ApiKey::ApiVersions => {
                dispatch_sync!(&header, &mut cursor, ApiVersionsRequest, |r| self
                    .handle_api_versions(r))
            }
            ApiKey::CreateTopics => {
                dispatch_async!(&header, &mut cursor, CreateTopicsRequest, |r| self
                    .handle_create_topics(r))
            }
            ApiKey::DeleteTopics => {
                dispatch_async!(&header, &mut cursor, DeleteTopicsRequest, |r| self
                    .handle_delete_topics(r))
            }
            ApiKey::InitProducerId => {
                dispatch_async!(&header, &mut cursor, InitProducerIdRequest, |r| self
                    .handle_init_producer_id(r))
            }
            ApiKey::AddPartitionsToTxn => {
                dispatch_sync!(&header, &mut cursor, AddPartitionsToTxnRequest, |r| self
                    .handle_add_partitions_to_txn(r))
            }
            ApiKey::AddOffsetsToTxn => {
                dispatch_sync!(&header, &mut cursor, AddOffsetsToTxnRequest, |r| self
                    .handle_add_offsets_to_txn(r))
            }
            ApiKey::EndTxn => {
                dispatch_sync!(&header, &mut cursor, EndTxnRequest, |r| self.handle_end_txn(r))
            }
            ApiKey::WriteTxnMarkers => {
                dispatch_async!(&header, &mut cursor, WriteTxnMarkersRequest, |r| self
                    .handle_write_txn_markers(r))
            }
            ApiKey::TxnOffsetCommit => {
                dispatch_async!(&header, &mut cursor, TxnOffsetCommitRequest, |r| self
                    .handle_txn_offset_commit(r))
            }
            other => return Err(DispatchError::UnsupportedApiKey(other)),
        };

        let mut out = Vec::with_capacity(4 + body.len());
        ResponseHeader {
            correlation_id: header.correlation_id,
        }
        .write(&mut out)?;
        out.extend_from_slice(&body);
        Ok(out)
    }

    /// `Fetch` only, writing straight to `out` instead of returning a
    /// buffer: the response header and every partition's metadata are
    /// framed normally, then the record bytes for partitions the backend
    /// can serve from a file-backed segment go out via `sendfile` instead
    /// of a copy through this process. Replica fetches (`replica_id !=
    /// -1`) skip the zero-copy path entirely and fall through to the
    /// ordinary encoder, since a follower's own fetch already advances
    /// replication state as a side effect of [`Self::handle_fetch`].
    #[instrument(skip(self, input, out))]
    pub async fn handle_fetch_zero_copy<W>(
        &self,
        input: &[u8],
        out: &mut W,
    ) -> Result<(), DispatchError>
    where
        W: std::io::Write + std::os::unix::io::AsRawFd,
    {
        let mut cursor: RequestCursor = std::io::Cursor::new(input);
        let header = RequestHeader::read(&mut cursor)?;
        if header.request_api_key != ApiKey::Fetch {
            return Err(DispatchError::UnsupportedApiKey(header.request_api_key));
        }
        if !FetchRequest::API_VERSION_RANGE.contains(header.request_api_version) {
            return Err(DispatchError::UnsupportedApiVersion {
                api_key: header.request_api_key,
                version: header.request_api_version,
            });
        }
        let req = FetchRequest::read_versioned(&mut cursor, header.request_api_version)?;

        let mut spans = Vec::new();
        if req.replica_id == -1 {
            for topic in &req.topics {
                for partition in &topic.partitions {
                    if let Ok(found) = self
                        .backend
                        .fetch_segment_spans(
                            &topic.topic,
                            partition.partition,
                            partition.fetch_offset,
                            partition.partition_max_bytes,
                        )
                        .await
                    {
                        spans.extend(found);
                    }
                }
            }
        }

        let response = self.handle_fetch(req).await;

        let mut header_and_metadata = Vec::new();
        ResponseHeader {
            correlation_id: header.correlation_id,
        }
        .write(&mut header_and_metadata)?;
        response.write_versioned(&mut header_and_metadata, header.request_api_version)?;

        crate::fetch::write_fetch_response(out, &header_and_metadata, &spans)?;
        Ok(())
    }

    #[instrument(skip(self, req), fields(transactional_id = ?req.transactional_id))]
    pub async fn handle_init_producer_id(
        &self,
        req: InitProducerIdRequest,
    ) -> InitProducerIdResponse {
        match self
            .producer_ids
            .get_or_create_producer_id(req.transactional_id.as_deref())
        {
            Ok((producer_id, producer_epoch)) => InitProducerIdResponse {
                throttle_time_ms: 0,
                error_code: None,
                producer_id,
                producer_epoch,
            },
            Err(_) => InitProducerIdResponse {
                throttle_time_ms: 0,
                error_code: Some(ErrorCode::InvalidProducerEpoch),
                producer_id: -1,
                producer_epoch: -1,
            },
        }
    }

    #[instrument(skip(self, req), fields(transactional_id = %req.transactional_id))]
    pub fn handle_add_partitions_to_txn(
        &self,
        req: AddPartitionsToTxnRequest,
    ) -> AddPartitionsToTxnResponse {
        let partitions: Vec<TxnTopicPartition> = req
            .topics
            .iter()
            .flat_map(|t| {
                t.partitions.iter().map(|&p| TxnTopicPartition {
                    topic: t.name.clone(),
                    partition: p,
                })
            })
            .collect();

        let outcome = self.txn_coordinator.add_partitions(
            &req.transactional_id,
            req.producer_id,
            req.producer_epoch,
            partitions,
        );

        let error_code = outcome.err().map(|e| match e {
            crate::txn::TxnError::Wire(code) => code,
        });

        let results = req
            .topics
            .iter()
            .map(|t| AddPartitionsToTxnTopicResult {
                name: t.name.clone(),
                results: t
                    .partitions
                    .iter()
                    .map(|&p| AddPartitionsToTxnPartitionResult {
                        partition_index: p,
                        error_code,
                    })
                    .collect(),
            })
            .collect();

        AddPartitionsToTxnResponse {
            throttle_time_ms: 0,
            results,
        }
    }

    #[instrument(skip(self, req), fields(transactional_id = %req.transactional_id, group_id = %req.group_id))]
    pub fn handle_add_offsets_to_txn(&self, req: AddOffsetsToTxnRequest) -> AddOffsetsToTxnResponse {
        let error_code = self
            .txn_coordinator
            .add_offsets_to_txn(
                &req.transactional_id,
                req.producer_id,
                req.producer_epoch,
                &req.group_id,
            )
            .err()
            .map(|crate::txn::TxnError::Wire(code)| code);

        AddOffsetsToTxnResponse {
            throttle_time_ms: 0,
            error_code,
        }
    }

    #[instrument(skip(self, req), fields(transactional_id = %req.transactional_id, committed = req.committed))]
    pub fn handle_end_txn(&self, req: EndTxnRequest) -> EndTxnResponse {
        let error_code = self
            .txn_coordinator
            .end_transaction(
                &req.transactional_id,
                req.producer_id,
                req.producer_epoch,
                req.committed,
            )
            .err()
            .map(|crate::txn::TxnError::Wire(code)| code);

        EndTxnResponse {
            throttle_time_ms: 0,
            error_code,
        }
    }

    #[instrument(skip(self, req), fields(group_id = %req.group_id))]
    pub async fn handle_join_group(&self, req: JoinGroupRequest) -> JoinGroupResponse {
        let subscribed_topics = req
            .protocols
            .first()
            .map(|p| {
                ConsumerGroupMemberMetadata::read(&mut std::io::Cursor::new(p.metadata.clone()))
                    .map(|m| m.topics)
                    .unwrap_or_default()
            })
            .unwrap_or_default();

        let outcome = self
            .groups
            .join_group(
                &req.group_id,
                &req.member_id,
                req.session_timeout_ms,
                req.protocols.first().map(|p| p.name.as_str()).unwrap_or(""),
                subscribed_topics,
                Instant::now(),
            )
            .await;

        JoinGroupResponse {
            throttle_time_ms: Some(0),
            error_code: None,
            generation_id: outcome.generation_id,
            protocol_name: outcome.protocol_name,
            leader: outcome.leader_id,
            member_id: outcome.member_id,
            members: outcome
                .members
                .into_iter()
                .map(|(member_id, topics)| JoinGroupResponseMember {
                    member_id,
                    group_instance_id: None,
                    metadata: ConsumerGroupMemberMetadata {
                        version: 0,
                        topics,
                        user_data: Vec::new(),
                        owned_partitions: Vec::new(),
                        generation_id: -1,
                        rack_id: None,
                    },
                })
                .collect(),
        }
    }

    #[instrument(skip(self, req), fields(group_id = %req.group_id))]
    pub async fn handle_sync_group(&self, req: SyncGroupRequest) -> SyncGroupResponse {
        let leader_assignments = req
            .assignments
            .iter()
            .map(|a| (a.member_id.clone(), a.assignment.clone()))
            .collect();

        match self
            .groups
            .sync_group(&req.group_id, &req.member_id, req.generation_id, leader_assignments)
            .await
        {
            Ok(assignment_bytes) => {
                let assignment = if assignment_bytes.is_empty() {
                    crate::protocol::messages::consumer_group::ConsumerGroupMemberAssignment {
                        version: 0,
                        assigned_partitions: Vec::new(),
                        user_data: Vec::new(),
                    }
                } else {
                    crate::protocol::messages::consumer_group::ConsumerGroupMemberAssignment::read(
                        &mut std::io::Cursor::new(assignment_bytes),
                    )
                    .unwrap_or(crate::protocol::messages::consumer_group::ConsumerGroupMemberAssignment {
                        version: 0,
                        assigned_partitions: Vec::new(),
                        user_data: Vec::new(),
                    })
                };
                SyncGroupResponse {
                    throttle_time_ms: Some(0),
                    error_code: None,
                    protocol_type: None,
                    protocol_name: None,
                    assignment,
                }
            }
            Err(err) => SyncGroupResponse {
                throttle_time_ms: Some(0),
                error_code: Some(group_error_code(err)),
                protocol_type: None,
                protocol_name: None,
                assignment: crate::protocol::messages::consumer_group::ConsumerGroupMemberAssignment {
                    version: 0,
                    assigned_partitions: Vec::new(),
                    user_data: Vec::new(),
                },
            },
        }
    }

    #[instrument(skip(self, req), fields(group_id = %req.group_id))]
    pub async fn handle_heartbeat(&self, req: HeartbeatRequest) -> HeartbeatResponse {
        let error_code = self
            .groups
            .heartbeat(&req.group_id, &req.member_id, req.generation_id, Instant::now())
            .await
            .err()
            .map(group_error_code);

        HeartbeatResponse {
            throttle_time_ms: Some(0),
            error_code,
        }
    }

    #[instrument(skip(self, req), fields(group_id = %req.group_id))]
    pub async fn handle_leave_group(&self, req: LeaveGroupRequest) -> LeaveGroupResponse {
        let error_code = self
            .groups
            .leave_group(&req.group_id, &req.member_id)
            .await
            .err()
            .map(group_error_code);

        LeaveGroupResponse {
            throttle_time_ms: Some(0),
            error_code,
            members: Vec::new(),
        }
    }

    /// `acks=0` returns immediately; `acks=1` returns once the leader's own
    /// append lands; `acks=-1` blocks on [`ProduceWaiter`] until the high
    /// watermark covers the appended offsets.
    #[instrument(skip(self, req))]
    pub async fn handle_produce(&self, req: ProduceRequest) -> ProduceResponse {
        let mut responses = Vec::with_capacity(req.topic_data.len());

        for topic in req.topic_data {
            let mut partition_responses = Vec::with_capacity(topic.partition_data.len());
            for partition in topic.partition_data {
                let outcome = self
                    .backend
                    .append(&topic.name, partition.index, partition.records)
                    .await;

                let response = match outcome {
                    Ok(result) => {
                        let error_code = if req.acks != -1 {
                            None
                        } else {
                            let topic_handle = self.backend.get_topic(&topic.name).await;
                            let leader_partition =
                                topic_handle.as_ref().and_then(|t| t.partitions.get(&partition.index));

                            let isr_len = leader_partition.map(|p| p.isr().len()).unwrap_or(0);

                            if (isr_len as i32) < self.min_insync_replicas {
                                Some(ErrorCode::NotEnoughReplicas)
                            } else {
                                // the leader's own append can be the only
                                // thing standing between HWM and this
                                // offset (e.g. an ISR of just the leader),
                                // and nothing else would ever advance it.
                                let current_hwm = leader_partition
                                    .map(|p| p.advance_hwm_after_append())
                                    .unwrap_or(0);

                                match self
                                    .produce_waiter
                                    .wait_for_ack(
                                        &topic.name,
                                        partition.index,
                                        result.leo - 1,
                                        current_hwm,
                                        self.default_ack_timeout_ms,
                                    )
                                    .await
                                {
                                    Ok(()) => None,
                                    Err(_) => Some(ErrorCode::RequestTimeout),
                                }
                            }
                        };

                        ProduceResponsePartition {
                            index: partition.index,
                            error_code,
                            base_offset: result.base_offset,
                            log_append_time_ms: None,
                            log_start_offset: Some(0),
                        }
                    }
                    Err(_) => ProduceResponsePartition {
                        index: partition.index,
                        error_code: Some(ErrorCode::UnknownTopicOrPartition),
                        base_offset: -1,
                        log_append_time_ms: None,
                        log_start_offset: None,
                    },
                };
                partition_responses.push(response);
            }
            responses.push(ProduceResponseTopic {
                name: topic.name,
                partition_responses,
            });
        }

        ProduceResponse {
            responses,
            throttle_time_ms: Some(0),
        }
    }

    /// `records` comes back empty: framing the on-disk `RecordBatch` bytes
    /// is the log store's job, not the dispatcher's.
    #[instrument(skip(self, req))]
    pub async fn handle_fetch(&self, req: FetchRequest) -> FetchResponse {
        let mut responses = Vec::with_capacity(req.topics.len());

        for topic in req.topics {
            let mut partitions = Vec::with_capacity(topic.partitions.len());
            let handle = self.backend.get_topic(&topic.topic).await;

            for partition_req in topic.partitions {
                let partition = handle
                    .as_ref()
                    .and_then(|t| t.partitions.get(&partition_req.partition));

                let response = match partition {
                    Some(partition) => {
                        if req.replica_id != -1 {
                            crate::fetch::record_replica_fetch(
                                &topic.topic,
                                partition_req.partition,
                                partition,
                                req.replica_id,
                                partition_req.fetch_offset,
                                Instant::now(),
                                self.replica_lag_max_messages,
                                &self.produce_waiter,
                            );
                        }

                        let high_watermark = partition.hwm();
                        FetchResponsePartition {
                            partition_index: partition_req.partition,
                            error_code: None,
                            high_watermark,
                            last_stable_offset: high_watermark,
                            aborted_transactions: Vec::new(),
                            records: Vec::new(),
                        }
                    }
                    None => FetchResponsePartition {
                        partition_index: partition_req.partition,
                        error_code: Some(ErrorCode::UnknownTopicOrPartition),
                        high_watermark: -1,
                        last_stable_offset: -1,
                        aborted_transactions: Vec::new(),
                        records: Vec::new(),
                    },
                };
                partitions.push(response);
            }

            responses.push(FetchResponseTopic {
                topic: topic.topic,
                partitions,
            });
        }

        FetchResponse {
            throttle_time_ms: 0,
            responses,
        }
    }

    /// With `topics: None` every topic this broker knows about is
    /// described; the broker list always has exactly this one node, since
    /// peer discovery sits outside this core.
    #[instrument(skip(self, req))]
    pub async fn handle_metadata(&self, req: MetadataRequest) -> MetadataResponse {
        let topics = match req.topics {
            Some(names) => {
                let mut out = Vec::with_capacity(names.len());
                for requested in names {
                    match self.backend.get_topic(&requested.name).await {
                        Some(topic) => out.push(self.describe_topic(&topic)),
                        None => out.push(MetadataResponseTopic {
                            error_code: Some(ErrorCode::UnknownTopicOrPartition),
                            name: requested.name,
                            is_internal: Some(false),
                            partitions: Vec::new(),
                        }),
                    }
                }
                out
            }
            None => self
                .backend
                .list_topics()
                .await
                .iter()
                .map(|t| self.describe_topic(t))
                .collect(),
        };

        MetadataResponse {
            throttle_time_ms: Some(0),
            brokers: vec![MetadataResponseBroker {
                node_id: self.broker_id,
                host: self.host.clone(),
                port: self.port,
                rack: None,
            }],
            cluster_id: None,
            controller_id: Some(self.broker_id),
            topics,
        }
    }

    fn describe_topic(&self, topic: &crate::topic::Topic) -> MetadataResponseTopic {
        MetadataResponseTopic {
            error_code: None,
            name: topic.name.clone(),
            is_internal: Some(false),
            partitions: topic
                .partitions
                .iter()
                .map(|(&index, partition)| MetadataResponsePartition {
                    error_code: None,
                    partition_index: index,
                    leader_id: partition.leader(),
                    replica_nodes: partition.replicas(),
                    isr_nodes: partition.isr(),
                })
                .collect(),
        }
    }

    /// `-1` resolves to the partition's latest offset (its LEO), `-2` to
    /// the earliest offset this core retains, which is always `0` (no log
    /// truncation/compaction in this core).
    #[instrument(skip(self, req))]
    pub async fn handle_list_offsets(&self, req: ListOffsetsRequest) -> ListOffsetsResponse {
        let mut topics = Vec::with_capacity(req.topics.len());

        for topic in req.topics {
            let handle = self.backend.get_topic(&topic.name).await;
            let mut partitions = Vec::with_capacity(topic.partitions.len());

            for partition_req in topic.partitions {
                let partition = handle
                    .as_ref()
                    .and_then(|t| t.partitions.get(&partition_req.partition_index));

                let response = match partition {
                    Some(partition) => {
                        let offset = match partition_req.timestamp {
                            -2 => 0,
                            _ => partition.leo(),
                        };
                        ListOffsetsResponsePartition {
                            partition_index: partition_req.partition_index,
                            error_code: None,
                            old_style_offsets: None,
                            timestamp: Some(partition_req.timestamp),
                            offset: Some(offset),
                        }
                    }
                    None => ListOffsetsResponsePartition {
                        partition_index: partition_req.partition_index,
                        error_code: Some(ErrorCode::UnknownTopicOrPartition),
                        old_style_offsets: None,
                        timestamp: None,
                        offset: None,
                    },
                };
                partitions.push(response);
            }

            topics.push(ListOffsetsResponseTopic {
                name: topic.name,
                partitions,
            });
        }

        ListOffsetsResponse {
            throttle_time_ms: Some(0),
            topics,
        }
    }

    #[instrument(skip(self, req), fields(group_id = %req.group_id))]
    pub async fn handle_offset_commit(&self, req: OffsetCommitRequest) -> OffsetCommitResponse {
        let mut topics = Vec::with_capacity(req.topics.len());

        for topic in req.topics {
            let mut partitions = Vec::with_capacity(topic.partitions.len());
            for partition in topic.partitions {
                self.groups
                    .commit_offset(&req.group_id, &topic.name, partition.partition_index, partition.committed_offset)
                    .await;
                partitions.push(PartitionCommitResult {
                    partition_index: partition.partition_index,
                    error_code: None,
                });
            }
            topics.push(TopicCommitResult {
                name: topic.name,
                partitions,
            });
        }

        OffsetCommitResponse {
            throttle_time_ms: Some(0),
            topics,
        }
    }

    /// `topics: None` reports every partition this group has ever
    /// committed an offset for.
    #[instrument(skip(self, req), fields(group_id = %req.group_id))]
    pub async fn handle_offset_fetch(&self, req: OffsetFetchRequest) -> OffsetFetchResponse {
        let topics = match req.topics {
            Some(requested) => {
                let mut topics = Vec::with_capacity(requested.len());
                for topic in requested {
                    let mut partitions = Vec::with_capacity(topic.partition_indexes.len());
                    for partition_index in topic.partition_indexes {
                        let committed = self
                            .groups
                            .fetch_offset(&req.group_id, &topic.name, partition_index)
                            .await;
                        partitions.push(OffsetFetchResponseTopicPartition {
                            partition_index,
                            committed_offset: committed.unwrap_or(-1),
                            committed_leader_epoch: -1,
                            metadata: None,
                            error_code: None,
                        });
                    }
                    topics.push(OffsetFetchResponseTopic {
                        name: topic.name,
                        partitions,
                    });
                }
                topics
            }
            None => {
                let mut by_topic: std::collections::BTreeMap<String, Vec<OffsetFetchResponseTopicPartition>> =
                    std::collections::BTreeMap::new();
                for (topic, partition_index, offset) in
                    self.groups.all_committed_offsets(&req.group_id).await
                {
                    by_topic.entry(topic).or_default().push(OffsetFetchResponseTopicPartition {
                        partition_index,
                        committed_offset: offset,
                        committed_leader_epoch: -1,
                        metadata: None,
                        error_code: None,
                    });
                }
                by_topic
                    .into_iter()
                    .map(|(name, partitions)| OffsetFetchResponseTopic { name, partitions })
                    .collect()
            }
        };

        OffsetFetchResponse {
            throttle_time_ms: Some(0),
            topics,
            error_code: None,
        }
    }

    /// Both the group and transaction coordinator live on this broker, so
    /// the response always names this node regardless of `key`/`key_type`.
    #[instrument(skip(self, req), fields(key = %req.key))]
    pub fn handle_find_coordinator(&self, _req: FindCoordinatorRequest) -> FindCoordinatorResponse {
        FindCoordinatorResponse {
            throttle_time_ms: Some(0),
            error_code: None,
            error_message: None,
            node_id: self.broker_id,
            host: self.host.clone(),
            port: self.port,
        }
    }

    #[instrument(skip(self, req))]
    pub async fn handle_create_topics(&self, req: CreateTopicsRequest) -> CreateTopicsResponse {
        let mut topics = Vec::with_capacity(req.topics.len());

        for topic in req.topics {
            let replicas = topic
                .assignments
                .first()
                .map(|a| a.broker_ids.clone())
                .unwrap_or_else(|| vec![self.broker_id]);

            let result = self
                .backend
                .create_topic(&topic.name, topic.num_partitions, replicas)
                .await;

            topics.push(match result {
                Ok(()) => CreateTopicResponse {
                    name: topic.name,
                    error_code: None,
                    error_message: None,
                    num_partitions: Some(topic.num_partitions),
                    replication_factor: Some(topic.replication_factor),
                    configs: Vec::new(),
                },
                Err(_) => CreateTopicResponse {
                    name: topic.name,
                    error_code: Some(ErrorCode::TopicAlreadyExists),
                    error_message: None,
                    num_partitions: None,
                    replication_factor: None,
                    configs: Vec::new(),
                },
            });
        }

        CreateTopicsResponse {
            throttle_time_ms: Some(0),
            topics,
        }
    }

    #[instrument(skip(self, req))]
    pub async fn handle_delete_topics(&self, req: DeleteTopicsRequest) -> DeleteTopicsResponse {
        let mut responses = Vec::with_capacity(req.topic_names.len());

        for name in req.topic_names {
            let response = if self.backend.get_topic(&name).await.is_some() {
                let _ = self.backend.delete_topic(&name).await;
                DeleteTopicsResponseTopic {
                    name,
                    error_code: None,
                    error_message: None,
                }
            } else {
                DeleteTopicsResponseTopic {
                    name,
                    error_code: Some(ErrorCode::UnknownTopicOrPartition),
                    error_message: None,
                }
            };
            responses.push(response);
        }

        DeleteTopicsResponse {
            throttle_time_ms: Some(0),
            responses,
        }
    }

    #[instrument(skip(self, req))]
    pub async fn handle_describe_groups(&self, req: DescribeGroupsRequest) -> DescribeGroupsResponse {
        let mut groups = Vec::with_capacity(req.groups.len());

        for group_id in req.groups {
            let response = match self.groups.describe_group(&group_id).await {
                Some(description) => DescribeGroupsResponseGroup {
                    error_code: None,
                    group_id,
                    group_state: description.state.to_string(),
                    protocol_type: description.protocol_type,
                    protocol_data: description.protocol_name,
                    members: description
                        .members
                        .into_iter()
                        .map(|(member_id, assignment)| DescribeGroupsResponseGroupMember {
                            member_id,
                            group_instance_id: None,
                            client_id: String::new(),
                            client_host: String::new(),
                            member_metadata: Vec::new(),
                            member_assignment: assignment,
                        })
                        .collect(),
                    authorized_operations: None,
                },
                None => DescribeGroupsResponseGroup {
                    error_code: Some(ErrorCode::GroupIdNotFound),
                    group_id,
                    group_state: "Dead".to_string(),
                    protocol_type: String::new(),
                    protocol_data: String::new(),
                    members: Vec::new(),
                    authorized_operations: None,
                },
            };
            groups.push(response);
        }

        DescribeGroupsResponse {
            throttle_time_ms: Some(0),
            groups,
        }
    }

    #[instrument(skip(self, _req))]
    pub async fn handle_list_groups(&self, _req: ListGroupsRequest) -> ListGroupsResponse {
        let groups = self
            .groups
            .list_groups()
            .await
            .into_iter()
            .map(|(group_id, state)| ListGroupsResponseGroup {
                group_id,
                protocol_type: "consumer".to_string(),
                group_state: Some(state.to_string()),
            })
            .collect();

        ListGroupsResponse {
            throttle_time_ms: Some(0),
            error_code: None,
            groups,
        }
    }

    /// Gates on the transaction coordinator before committing anything:
    /// offsets only become visible to consumers once the matching
    /// `EndTxn` commits, but they are written through to the group
    /// coordinator now so a subsequent `OffsetFetch` inside the same
    /// transaction sees them.
    #[instrument(skip(self, req), fields(transactional_id = %req.transactional_id, group_id = %req.group_id))]
    pub async fn handle_txn_offset_commit(&self, req: TxnOffsetCommitRequest) -> TxnOffsetCommitResponse {
        let gate = self.txn_coordinator.commit_offsets_in_transaction(
            &req.transactional_id,
            req.producer_id,
            req.producer_epoch,
            &req.group_id,
        );

        let mut topics = Vec::with_capacity(req.topics.len());
        for topic in req.topics {
            let mut partitions = Vec::with_capacity(topic.partitions.len());
            for partition in topic.partitions {
                let error_code = match gate {
                    Ok(()) => {
                        self.groups
                            .commit_offset(&req.group_id, &topic.name, partition.partition_index, partition.committed_offset)
                            .await;
                        None
                    }
                    Err(crate::txn::TxnError::Wire(code)) => Some(code),
                };
                partitions.push(TxnOffsetCommitResponsePartition {
                    partition_index: partition.partition_index,
                    error_code,
                });
            }
            topics.push(TxnOffsetCommitResponseTopic {
                name: topic.name,
                partitions,
            });
        }

        TxnOffsetCommitResponse {
            throttle_time_ms: 0,
            topics,
        }
    }

    /// Scoped to intent-level logging: no control-record insertion into the
    /// log store, since `records` is an opaque blob this core never parses
    /// (see the `Fetch` note on `RecordBatch` framing).
    #[instrument(skip(self, req))]
    pub async fn handle_write_txn_markers(&self, req: WriteTxnMarkersRequest) -> WriteTxnMarkersResponse {
        let mut markers = Vec::with_capacity(req.markers.len());

        for marker in req.markers {
            tracing::info!(
                producer_id = marker.producer_id,
                committed = marker.transaction_result,
                "write txn marker"
            );

            let topics = marker
                .topics
                .into_iter()
                .map(|topic| WriteTxnMarkersTopicResult {
                    name: topic.name,
                    partitions: topic
                        .partition_indexes
                        .into_iter()
                        .map(|partition_index| WriteTxnMarkersPartitionResult {
                            partition_index,
                            error_code: None,
                        })
                        .collect(),
                })
                .collect();

            markers.push(WritableTxnMarkerResult {
                producer_id: marker.producer_id,
                topics,
            });
        }

        WriteTxnMarkersResponse { markers }
    }
}

fn group_error_code(err: GroupError) -> ErrorCode {
    match err {
        GroupError::UnknownMemberId => ErrorCode::UnknownMemberId,
        GroupError::IllegalGeneration => ErrorCode::IllegalGeneration,
        GroupError::RebalanceInProgress => ErrorCode::RebalanceInProgress,
        GroupError::GroupIdNotFound => ErrorCode::GroupIdNotFound,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::DirectBackend;
    use crate::batch::{BatchAggregator, BatchAggregatorConfig};
    use crate::protocol::messages::produce::{ProduceRequestPartitionData, ProduceRequestTopicData};

    fn dispatcher() -> Dispatcher {
        Dispatcher {
            backend: Arc::new(DirectBackend::new()),
            producer_ids: Arc::new(ProducerIdManager::new()),
            txn_coordinator: Arc::new(TransactionCoordinator::new()),
            produce_waiter: ProduceWaiter::new(),
            groups: Arc::new(ConsumerGroupCoordinator::new()),
            batches: Arc::new(BatchAggregator::new(BatchAggregatorConfig {
                max_size: 1000,
                max_bytes: 1 << 20,
                linger: std::time::Duration::from_millis(5),
                adaptive_max_size: 10_000,
            })),
            default_ack_timeout_ms: 200,
            broker_id: 1,
            host: "localhost".into(),
            port: 9092,
            replica_lag_max_messages: 0,
            min_insync_replicas: 1,
        }
    }

    #[tokio::test]
    async fn produce_with_acks_zero_does_not_block() {
        let d = dispatcher();
        d.backend.create_topic("orders", 1, vec![1]).await.unwrap();

        let resp = d
            .handle_produce(ProduceRequest {
                transactional_id: None,
                acks: 0,
                timeout_ms: 1000,
                topic_data: vec![ProduceRequestTopicData {
                    name: "orders".into(),
                    partition_data: vec![ProduceRequestPartitionData {
                        index: 0,
                        records: vec![1, 2, 3],
                    }],
                }],
            })
            .await;

        assert_eq!(resp.responses[0].partition_responses[0].base_offset, 0);
    }

    #[tokio::test]
    async fn produce_acks_all_waits_for_hwm_then_acks() {
        let d = dispatcher();
        d.backend.create_topic("orders", 1, vec![1, 2, 3]).await.unwrap();
        let topic = d.backend.get_topic("orders").await.unwrap();

        let handle = {
            let waiter = d.produce_waiter.clone();
            let topic = topic.clone();
            tokio::spawn(async move {
                tokio::task::yield_now().await;
                let partition = topic.partitions.get(&0).unwrap();
                partition.update_follower_leo(2, 1, Instant::now());
                if let Some(hwm) = partition.update_follower_leo(3, 1, Instant::now()) {
                    waiter.notify_hwm_advanced("orders", 0, hwm);
                }
            })
        };

        let resp = d
            .handle_produce(ProduceRequest {
                transactional_id: None,
                acks: -1,
                timeout_ms: 2000,
                topic_data: vec![ProduceRequestTopicData {
                    name: "orders".into(),
                    partition_data: vec![ProduceRequestPartitionData {
                        index: 0,
                        records: vec![1],
                    }],
                }],
            })
            .await;

        handle.await.unwrap();
        assert_eq!(resp.responses[0].partition_responses[0].error_code, None);
        assert_eq!(resp.responses[0].partition_responses[0].base_offset, 0);
    }

    #[tokio::test]
    async fn produce_acks_all_with_empty_isr_fails_fast() {
        let d = dispatcher();
        d.backend.create_topic("orders", 1, vec![1, 2, 3]).await.unwrap();
        d.backend
            .get_topic("orders")
            .await
            .unwrap()
            .partitions
            .get(&0)
            .unwrap()
            .set_isr(Vec::new());

        let resp = d
            .handle_produce(ProduceRequest {
                transactional_id: None,
                acks: -1,
                timeout_ms: 1000,
                topic_data: vec![ProduceRequestTopicData {
                    name: "orders".into(),
                    partition_data: vec![ProduceRequestPartitionData {
                        index: 0,
                        records: vec![1],
                    }],
                }],
            })
            .await;

        assert_eq!(
            resp.responses[0].partition_responses[0].error_code,
            Some(ErrorCode::NotEnoughReplicas)
        );
    }

    #[tokio::test]
    async fn produce_against_unknown_topic_reports_error_code() {
        let d = dispatcher();

        let resp = d
            .handle_produce(ProduceRequest {
                transactional_id: None,
                acks: 1,
                timeout_ms: 1000,
                topic_data: vec![ProduceRequestTopicData {
                    name: "missing".into(),
                    partition_data: vec![ProduceRequestPartitionData {
                        index: 0,
                        records: vec![],
                    }],
                }],
            })
            .await;

        assert_eq!(
            resp.responses[0].partition_responses[0].error_code,
            Some(ErrorCode::UnknownTopicOrPartition)
        );
    }

    #[test]
    fn api_versions_lists_produce() {
        let d = dispatcher();
        let resp = d.handle_api_versions(ApiVersionsRequest {
            client_software_name: None,
            client_software_version: None,
        });
        assert!(resp.api_keys.iter().any(|k| k.api_key == ApiKey::Produce));
    }

    #[tokio::test]
    async fn init_producer_id_mints_monotonic_ids() {
        let d = dispatcher();
        let a = d
            .handle_init_producer_id(InitProducerIdRequest {
                transactional_id: None,
                transaction_timeout_ms: 1000,
                producer_id: None,
                producer_epoch: None,
            })
            .await;
        let b = d
            .handle_init_producer_id(InitProducerIdRequest {
                transactional_id: None,
                transaction_timeout_ms: 1000,
                producer_id: None,
                producer_epoch: None,
            })
            .await;
        assert!(b.producer_id > a.producer_id);
    }

    #[tokio::test]
    async fn metadata_with_no_topics_lists_everything_known() {
        let d = dispatcher();
        d.backend.create_topic("orders", 2, vec![1]).await.unwrap();

        let resp = d
            .handle_metadata(MetadataRequest {
                topics: None,
                allow_auto_topic_creation: None,
            })
            .await;

        assert_eq!(resp.brokers[0].node_id, d.broker_id);
        assert_eq!(resp.topics.len(), 1);
        assert_eq!(resp.topics[0].name, "orders");
        assert_eq!(resp.topics[0].partitions.len(), 2);
    }

    #[tokio::test]
    async fn metadata_for_unknown_topic_reports_error_code() {
        use crate::protocol::messages::metadata::MetadataRequestTopic;

        let d = dispatcher();
        let resp = d
            .handle_metadata(MetadataRequest {
                topics: Some(vec![MetadataRequestTopic {
                    name: "missing".into(),
                }]),
                allow_auto_topic_creation: None,
            })
            .await;

        assert_eq!(resp.topics[0].error_code, Some(ErrorCode::UnknownTopicOrPartition));
    }

    #[tokio::test]
    async fn list_offsets_latest_matches_leo() {
        use crate::protocol::messages::list_offsets::{ListOffsetsRequestPartition, ListOffsetsRequestTopic};

        let d = dispatcher();
        d.backend.create_topic("orders", 1, vec![1]).await.unwrap();
        d.backend.append("orders", 0, vec![1, 2, 3]).await.unwrap();

        let resp = d
            .handle_list_offsets(ListOffsetsRequest {
                replica_id: -1,
                isolation_level: None,
                topics: vec![ListOffsetsRequestTopic {
                    name: "orders".into(),
                    partitions: vec![ListOffsetsRequestPartition {
                        partition_index: 0,
                        timestamp: -1,
                        max_num_offsets: None,
                    }],
                }],
            })
            .await;

        assert_eq!(resp.topics[0].partitions[0].offset, Some(1));
    }

    #[tokio::test]
    async fn offset_commit_then_fetch_round_trips() {
        use crate::protocol::messages::offset_commit::{PartitionCommit, TopicCommit};
        use crate::protocol::messages::offset_fetch::OffsetFetchRequestTopic;

        let d = dispatcher();
        d.handle_offset_commit(OffsetCommitRequest {
            group_id: "g".into(),
            generation_id: -1,
            member_id: "".into(),
            retention_time_ms: None,
            group_instance_id: None,
            topics: vec![TopicCommit {
                name: "orders".into(),
                partitions: vec![PartitionCommit {
                    partition_index: 0,
                    committed_offset: 42,
                    commit_timestamp: -1,
                    committed_leader_epoch: -1,
                    committed_metadata: None,
                }],
            }],
        })
        .await;

        let resp = d
            .handle_offset_fetch(OffsetFetchRequest {
                group_id: "g".into(),
                topics: Some(vec![OffsetFetchRequestTopic {
                    name: "orders".into(),
                    partition_indexes: vec![0],
                }]),
                require_stable: None,
            })
            .await;

        assert_eq!(resp.topics[0].partitions[0].committed_offset, 42);
    }

    #[tokio::test]
    async fn offset_fetch_with_no_topics_lists_every_commit() {
        use crate::protocol::messages::offset_commit::{PartitionCommit, TopicCommit};

        let d = dispatcher();
        d.handle_offset_commit(OffsetCommitRequest {
            group_id: "g".into(),
            generation_id: -1,
            member_id: "".into(),
            retention_time_ms: None,
            group_instance_id: None,
            topics: vec![TopicCommit {
                name: "orders".into(),
                partitions: vec![PartitionCommit {
                    partition_index: 0,
                    committed_offset: 42,
                    commit_timestamp: -1,
                    committed_leader_epoch: -1,
                    committed_metadata: None,
                }],
            }],
        })
        .await;

        let resp = d
            .handle_offset_fetch(OffsetFetchRequest {
                group_id: "g".into(),
                topics: None,
                require_stable: None,
            })
            .await;

        assert_eq!(resp.topics.len(), 1);
        assert_eq!(resp.topics[0].name, "orders");
        assert_eq!(resp.topics[0].partitions[0].committed_offset, 42);
    }

    #[test]
    fn find_coordinator_always_names_this_broker() {
        use crate::protocol::messages::find_coordinator::CoordinatorType;

        let d = dispatcher();
        let resp = d.handle_find_coordinator(FindCoordinatorRequest {
            key: "my-group".into(),
            key_type: CoordinatorType::Group,
        });

        assert_eq!(resp.node_id, d.broker_id);
        assert_eq!(resp.host, d.host);
        assert_eq!(resp.port, d.port);
    }

    #[tokio::test]
    async fn create_topics_then_delete_round_trips() {
        use crate::protocol::messages::create_topics::CreateTopicRequest;

        let d = dispatcher();
        let created = d
            .handle_create_topics(CreateTopicsRequest {
                topics: vec![CreateTopicRequest {
                    name: "orders".into(),
                    num_partitions: 3,
                    replication_factor: 1,
                    assignments: Vec::new(),
                    configs: Vec::new(),
                }],
                timeout_ms: 1000,
                validate_only: None,
            })
            .await;
        assert_eq!(created.topics[0].error_code, None);
        assert!(d.backend.get_topic("orders").await.is_some());

        let deleted = d
            .handle_delete_topics(DeleteTopicsRequest {
                topic_names: vec!["orders".into()],
                timeout_ms: 1000,
            })
            .await;
        assert_eq!(deleted.responses[0].error_code, None);
        assert!(d.backend.get_topic("orders").await.is_none());
    }

    #[tokio::test]
    async fn delete_topics_reports_unknown_topic() {
        let d = dispatcher();
        let resp = d
            .handle_delete_topics(DeleteTopicsRequest {
                topic_names: vec!["missing".into()],
                timeout_ms: 1000,
            })
            .await;
        assert_eq!(
            resp.responses[0].error_code,
            Some(ErrorCode::UnknownTopicOrPartition)
        );
    }

    #[tokio::test]
    async fn create_topics_rejects_duplicate() {
        use crate::protocol::messages::create_topics::CreateTopicRequest;

        let d = dispatcher();
        d.backend.create_topic("orders", 1, vec![1]).await.unwrap();

        let resp = d
            .handle_create_topics(CreateTopicsRequest {
                topics: vec![CreateTopicRequest {
                    name: "orders".into(),
                    num_partitions: 1,
                    replication_factor: 1,
                    assignments: Vec::new(),
                    configs: Vec::new(),
                }],
                timeout_ms: 1000,
                validate_only: None,
            })
            .await;
        assert_eq!(resp.topics[0].error_code, Some(ErrorCode::TopicAlreadyExists));
    }

    #[tokio::test]
    async fn describe_groups_reports_stable_members() {
        let d = dispatcher();
        let leader = d
            .groups
            .join_group("g", "", 10_000, "range", vec!["orders".into()], Instant::now())
            .await;
        d.groups
            .sync_group(
                "g",
                &leader.member_id,
                leader.generation_id,
                vec![(leader.member_id.clone(), b"assignment".to_vec())],
            )
            .await
            .unwrap();

        let resp = d
            .handle_describe_groups(DescribeGroupsRequest {
                groups: vec!["g".into()],
                include_authorized_operations: false,
            })
            .await;

        assert_eq!(resp.groups[0].group_state, "Stable");
        assert_eq!(resp.groups[0].members.len(), 1);
    }

    #[tokio::test]
    async fn describe_groups_reports_unknown_group() {
        let d = dispatcher();
        let resp = d
            .handle_describe_groups(DescribeGroupsRequest {
                groups: vec!["missing".into()],
                include_authorized_operations: false,
            })
            .await;
        assert_eq!(resp.groups[0].error_code, Some(ErrorCode::GroupIdNotFound));
    }

    #[tokio::test]
    async fn list_groups_reflects_join() {
        let d = dispatcher();
        d.groups
            .join_group("g", "", 10_000, "range", vec!["orders".into()], Instant::now())
            .await;

        let resp = d.handle_list_groups(ListGroupsRequest { states_filter: Vec::new() }).await;
        assert!(resp.groups.iter().any(|g| g.group_id == "g"));
    }

    #[tokio::test]
    async fn txn_offset_commit_requires_an_open_transaction() {
        use crate::protocol::messages::txn_offset_commit::{
            TxnOffsetCommitRequestPartition, TxnOffsetCommitRequestTopic,
        };

        let d = dispatcher();
        let resp = d
            .handle_txn_offset_commit(TxnOffsetCommitRequest {
                transactional_id: "txn-1".into(),
                group_id: "g".into(),
                producer_id: 1,
                producer_epoch: 0,
                generation_id: None,
                member_id: None,
                group_instance_id: None,
                topics: vec![TxnOffsetCommitRequestTopic {
                    name: "orders".into(),
                    partitions: vec![TxnOffsetCommitRequestPartition {
                        partition_index: 0,
                        committed_offset: 10,
                        committed_leader_epoch: -1,
                        committed_metadata: None,
                    }],
                }],
            })
            .await;

        assert_eq!(
            resp.topics[0].partitions[0].error_code,
            Some(ErrorCode::InvalidProducerIdMapping)
        );
    }

    #[tokio::test]
    async fn write_txn_markers_acks_every_marker() {
        use crate::protocol::messages::write_txn_markers::{WritableTxnMarker, WritableTxnMarkerTopic};

        let d = dispatcher();
        let resp = d
            .handle_write_txn_markers(WriteTxnMarkersRequest {
                markers: vec![WritableTxnMarker {
                    producer_id: 7,
                    producer_epoch: 0,
                    transaction_result: true,
                    topics: vec![WritableTxnMarkerTopic {
                        name: "orders".into(),
                        partition_indexes: vec![0, 1],
                    }],
                    coordinator_epoch: 0,
                }],
            })
            .await;

        assert_eq!(resp.markers[0].producer_id, 7);
        assert_eq!(resp.markers[0].topics[0].partitions.len(), 2);
    }

    #[tokio::test]
    async fn fetch_against_known_partition_reports_high_watermark() {
        use crate::protocol::messages::fetch::{FetchRequestPartition, FetchRequestTopic};

        let d = dispatcher();
        d.backend.create_topic("orders", 1, vec![1]).await.unwrap();
        d.backend.append("orders", 0, vec![1]).await.unwrap();

        let resp = d
            .handle_fetch(FetchRequest {
                replica_id: -1,
                max_wait_ms: 0,
                min_bytes: 0,
                max_bytes: None,
                isolation_level: None,
                topics: vec![FetchRequestTopic {
                    topic: "orders".into(),
                    partitions: vec![FetchRequestPartition {
                        partition: 0,
                        fetch_offset: 0,
                        partition_max_bytes: 1 << 20,
                    }],
                }],
            })
            .await;

        assert_eq!(resp.responses[0].partitions[0].error_code, None);
        assert!(resp.responses[0].partitions[0].records.is_empty());
    }

    #[tokio::test]
    async fn fetch_against_unknown_topic_reports_error_code() {
        use crate::protocol::messages::fetch::{FetchRequestPartition, FetchRequestTopic};

        let d = dispatcher();
        let resp = d
            .handle_fetch(FetchRequest {
                replica_id: -1,
                max_wait_ms: 0,
                min_bytes: 0,
                max_bytes: None,
                isolation_level: None,
                topics: vec![FetchRequestTopic {
                    topic: "missing".into(),
                    partitions: vec![FetchRequestPartition {
                        partition: 0,
                        fetch_offset: 0,
                        partition_max_bytes: 1 << 20,
                    }],
                }],
            })
            .await;

        assert_eq!(
            resp.responses[0].partitions[0].error_code,
            Some(ErrorCode::UnknownTopicOrPartition)
        );
    }
}
