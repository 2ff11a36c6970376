// Copyright (c) Argument Computer Corporation
// SPDX-License-Identifier: Apache-2.0

//! Scripted in-memory backing clients and fetchers shared by the unit tests.

use crate::client::error::ClientError;
use crate::client::{BeaconClient, ExecutionClient};
use crate::health::probe::unix_now;
use crate::health::{Endpoints, HealthConfig, HealthTracker};
use crate::state::fetcher::DetailsFetcher;
use crate::types::rpc::RpcCall;
use async_trait::async_trait;
use ethers_core::types::{Address, Bytes};
use network_state_core::types::block::{
    BeaconBlock, BeaconHead, BeaconSyncStatus, ExecutionHeader, SyncProgress,
};
use network_state_core::types::config::BeaconConfig;
use parking_lot::Mutex;
use serde_json::{json, Value};
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

pub const GENESIS_TIME: u64 = 1_606_824_023;
pub const SECONDS_PER_SLOT: u64 = 12;
pub const SLOTS_PER_EPOCH: u64 = 32;

/// Execution block number carried by the payload of the beacon block at slot 0.
pub const EXECUTION_BLOCK_OFFSET: u64 = 1_000;

pub fn beacon_config(genesis_time: u64) -> BeaconConfig {
    BeaconConfig::new(genesis_time, SECONDS_PER_SLOT, SLOTS_PER_EPOCH).unwrap()
}

/// Responses of a sync probe, in order. The last one repeats once the others are consumed.
#[derive(Debug)]
struct Script<T>(Mutex<VecDeque<Result<T, String>>>);

impl<T: Clone> Script<T> {
    fn new(responses: Vec<Result<T, String>>) -> Self {
        Self(Mutex::new(responses.into()))
    }

    fn next(&self) -> Result<T, ClientError> {
        let mut responses = self.0.lock();
        let next = if responses.len() > 1 {
            responses.pop_front()
        } else {
            responses.front().cloned()
        };

        next.unwrap_or_else(|| Err("empty script".into()))
            .map_err(|message| ClientError::Request {
                endpoint: "mock".into(),
                source: message.into(),
            })
    }
}

/// Counts calls and the maximum number of calls in flight at once.
#[derive(Debug, Default)]
pub struct CallCounter {
    calls: AtomicUsize,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

impl CallCounter {
    pub async fn track<F: std::future::Future>(&self, future: F) -> F::Output {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let in_flight = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(in_flight, Ordering::SeqCst);

        // Give other tasks a chance to overlap with this call.
        tokio::task::yield_now().await;
        let output = future.await;

        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        output
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }
}

#[derive(Debug)]
pub struct MockExecutionClient {
    sync_script: Script<Option<SyncProgress>>,
    latest: Mutex<ExecutionHeader>,
    code: Mutex<HashMap<Address, Bytes>>,
    sync_counter: CallCounter,
    hang_after: Option<usize>,
    code_calls: AtomicUsize,
    batches: Mutex<Vec<usize>>,
}

impl MockExecutionClient {
    /// A client reporting no sync progress, with a latest block produced right now.
    pub fn synced() -> Self {
        Self {
            sync_script: Script::new(vec![Ok(None)]),
            latest: Mutex::new(ExecutionHeader::new(EXECUTION_BLOCK_OFFSET, unix_now())),
            code: Mutex::new(HashMap::new()),
            sync_counter: CallCounter::default(),
            hang_after: None,
            code_calls: AtomicUsize::new(0),
            batches: Mutex::new(Vec::new()),
        }
    }

    pub fn with_sync_script(self, responses: Vec<Result<Option<SyncProgress>, String>>) -> Self {
        self.set_sync_script(responses);
        self
    }

    pub fn set_sync_script(&self, responses: Vec<Result<Option<SyncProgress>, String>>) {
        *self.sync_script.0.lock() = responses.into();
    }

    /// Stop answering sync probes once `calls` of them were answered.
    pub fn with_hang_after(mut self, calls: usize) -> Self {
        self.hang_after = Some(calls);
        self
    }

    pub fn with_latest_timestamp(self, timestamp: u64) -> Self {
        let number = self.latest.lock().number();
        *self.latest.lock() = ExecutionHeader::new(number, timestamp);
        self
    }

    pub fn with_latest_header(self, header: ExecutionHeader) -> Self {
        *self.latest.lock() = header;
        self
    }

    pub fn with_code(self, address: Address, code: Bytes) -> Self {
        self.set_code(address, code);
        self
    }

    pub fn set_code(&self, address: Address, code: Bytes) {
        self.code.lock().insert(address, code);
    }

    pub fn sync_calls(&self) -> usize {
        self.sync_counter.calls()
    }

    pub fn code_calls(&self) -> usize {
        self.code_calls.load(Ordering::SeqCst)
    }

    /// Number of calls of each batch request received.
    pub fn batches(&self) -> Vec<usize> {
        self.batches.lock().clone()
    }

    /// Balance served for an account, derived from its last byte.
    pub fn balance_of(address: &Address) -> u64 {
        u64::from(address.as_bytes()[19]) * 1_000
    }

    fn answer(call: &RpcCall) -> Result<Value, ClientError> {
        let address: Address = serde_json::from_value(call.params()[0].clone()).map_err(|err| {
            ClientError::Response {
                endpoint: call.method().clone(),
                source: Box::new(err),
            }
        })?;

        match call.method().as_str() {
            "eth_getBalance" => Ok(json!(format!("0x{:x}", Self::balance_of(&address)))),
            "eth_getTransactionCount" => Ok(json!(format!("0x{:x}", address.as_bytes()[19]))),
            method => Err(ClientError::Rpc {
                endpoint: method.to_string(),
                code: -32601,
                message: "method not found".into(),
            }),
        }
    }
}

#[async_trait]
impl ExecutionClient for MockExecutionClient {
    async fn header_by_number(&self, number: Option<u64>) -> Result<ExecutionHeader, ClientError> {
        let latest = *self.latest.lock();

        Ok(match number {
            Some(number) => ExecutionHeader::new(number, latest.timestamp()),
            None => latest,
        })
    }

    async fn sync_progress(&self) -> Result<Option<SyncProgress>, ClientError> {
        let hang = self
            .hang_after
            .is_some_and(|calls| self.sync_counter.calls() >= calls);

        self.sync_counter
            .track(async {
                if hang {
                    std::future::pending::<()>().await;
                }
                self.sync_script.next()
            })
            .await
    }

    async fn code_at(&self, address: Address, _block: Option<u64>) -> Result<Bytes, ClientError> {
        self.code_calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.code.lock().get(&address).cloned().unwrap_or_default())
    }

    async fn batch_request(&self, calls: &[RpcCall]) -> Result<Vec<Value>, ClientError> {
        self.batches.lock().push(calls.len());
        calls.iter().map(Self::answer).collect()
    }
}

#[derive(Debug)]
pub struct MockBeaconClient {
    config: BeaconConfig,
    head: Mutex<BeaconHead>,
    blocks: Mutex<HashMap<u64, BeaconBlock>>,
    requested_slots: Mutex<Vec<u64>>,
    sync_script: Script<BeaconSyncStatus>,
    sync_counter: CallCounter,
}

impl MockBeaconClient {
    /// A synced client without any block.
    pub fn synced() -> Self {
        Self {
            config: beacon_config(GENESIS_TIME),
            head: Mutex::new(BeaconHead::default()),
            blocks: Mutex::new(HashMap::new()),
            requested_slots: Mutex::new(Vec::new()),
            sync_script: Script::new(vec![Ok(BeaconSyncStatus::new(false, 0, 0))]),
            sync_counter: CallCounter::default(),
        }
    }

    pub fn with_config(mut self, config: BeaconConfig) -> Self {
        self.config = config;
        self
    }

    pub fn with_sync_script(self, responses: Vec<Result<BeaconSyncStatus, String>>) -> Self {
        *self.sync_script.0.lock() = responses.into();
        self
    }

    pub fn with_finalized_epoch(self, epoch: u64) -> Self {
        *self.head.lock() = BeaconHead::new(epoch, epoch + 1, epoch);
        self
    }

    /// Add a block with an execution payload at each of the given slots.
    pub fn with_blocks(self, slots: impl IntoIterator<Item = u64>) -> Self {
        for slot in slots {
            self.insert_block(Self::block_at(slot));
        }
        self
    }

    pub fn with_block(self, block: BeaconBlock) -> Self {
        self.insert_block(block);
        self
    }

    pub fn insert_block(&self, block: BeaconBlock) {
        self.blocks.lock().insert(block.slot(), block);
    }

    pub fn block_at(slot: u64) -> BeaconBlock {
        BeaconBlock::new(
            slot,
            slot % 64,
            Some(EXECUTION_BLOCK_OFFSET + slot),
            Some(Address::repeat_byte(0xfe)),
        )
    }

    /// Slots requested so far, in order.
    pub fn requested_slots(&self) -> Vec<u64> {
        self.requested_slots.lock().clone()
    }

    pub fn sync_calls(&self) -> usize {
        self.sync_counter.calls()
    }

    pub fn max_in_flight(&self) -> usize {
        self.sync_counter.max_in_flight()
    }
}

#[async_trait]
impl BeaconClient for MockBeaconClient {
    async fn get_eth2_config(&self) -> Result<BeaconConfig, ClientError> {
        Ok(self.config)
    }

    async fn get_beacon_head(&self) -> Result<BeaconHead, ClientError> {
        Ok(*self.head.lock())
    }

    async fn get_beacon_block(&self, slot: u64) -> Result<Option<BeaconBlock>, ClientError> {
        self.requested_slots.lock().push(slot);
        Ok(self.blocks.lock().get(&slot).cloned())
    }

    async fn get_sync_status(&self) -> Result<BeaconSyncStatus, ClientError> {
        self.sync_counter
            .track(async { self.sync_script.next() })
            .await
    }
}

/// Build a tracker over mock clients. A synced beacon client is used when none is given.
pub fn tracker_with(
    execution: Arc<MockExecutionClient>,
    execution_fallback: Option<Arc<MockExecutionClient>>,
    beacon: Option<Arc<MockBeaconClient>>,
) -> Arc<HealthTracker> {
    let beacon = beacon.unwrap_or_else(|| Arc::new(MockBeaconClient::synced()));

    Arc::new(HealthTracker::new(
        Endpoints::new(
            execution as Arc<dyn ExecutionClient>,
            execution_fallback.map(|client| client as Arc<dyn ExecutionClient>),
        ),
        Endpoints::new(beacon as Arc<dyn BeaconClient>, None),
        HealthConfig::default(),
    ))
}

/// Details served by the [`MockFetcher`], remembering the block they were read at.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MockDetails {
    pub address: Address,
    pub block_number: u64,
}

#[derive(Debug, Default)]
pub struct MockFetcher {
    addresses: Vec<Address>,
    delay: Option<Duration>,
    batches: Mutex<Vec<(u64, usize)>>,
    counter: CallCounter,
}

impl MockFetcher {
    /// A fetcher tracking `count` distinct entities.
    pub fn with_entities(count: u8) -> Self {
        Self {
            addresses: (1..=count).map(Address::repeat_byte).collect(),
            ..Self::default()
        }
    }

    /// Make every batch take `delay` to complete.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn addresses(&self) -> &[Address] {
        &self.addresses
    }

    /// Block number and size of every batch fetched so far.
    pub fn batches(&self) -> Vec<(u64, usize)> {
        self.batches.lock().clone()
    }

    pub fn max_in_flight(&self) -> usize {
        self.counter.max_in_flight()
    }
}

#[async_trait]
impl DetailsFetcher for MockFetcher {
    type Details = MockDetails;
    type NetworkDetails = u64;

    async fn entity_addresses(
        &self,
        _client: &dyn ExecutionClient,
        _block_number: u64,
    ) -> Result<Vec<Address>, ClientError> {
        Ok(self.addresses.clone())
    }

    async fn network_details(
        &self,
        _client: &dyn ExecutionClient,
        block_number: u64,
    ) -> Result<u64, ClientError> {
        Ok(block_number)
    }

    async fn fetch_batch(
        &self,
        _client: &dyn ExecutionClient,
        block_number: u64,
        addresses: &[Address],
    ) -> Result<Vec<MockDetails>, ClientError> {
        self.batches.lock().push((block_number, addresses.len()));

        let details = self
            .counter
            .track(async {
                if let Some(delay) = self.delay {
                    tokio::time::sleep(delay).await;
                }

                addresses
                    .iter()
                    .map(|address| MockDetails {
                        address: *address,
                        block_number,
                    })
                    .collect::<Vec<_>>()
            })
            .await;

        Ok(details)
    }
}
