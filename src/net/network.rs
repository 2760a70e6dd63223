//! 共享无线信道
//!
//! 所有节点共用一个信道。一次发送在每个接收者处的功率由损耗矩阵决定：
//! 超过灵敏度的帧被锁定接收，其他同时进行的发送计为干扰；帧结束时按
//! 最坏信干噪比判定成败。载波侦听使用总接收功率。

use super::app::{OnOffApp, OnOffConfig, PacketSink, ProbeConfig, Sampler};
use super::events::{AckTimeout, AppPhase, AppStep, SendAck, SendProbe, TryAccess, TxEnd};
use super::id::{NodeId, TxId};
use super::loss::MatrixLossModel;
use super::mac::{Device, MacConfig, MacState, RxLock};
use super::packet::{Frame, Packet};
use super::phy::{PhyConfig, db_to_ratio, dbm_to_mw};
use super::stats::{InterfaceStats, SinkStats};
use crate::error::{CdosError, Result};
use crate::sim::{SimTime, Simulator};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use tracing::{debug, trace};

/// 应用层随机流与设备随机流错开，互不影响
const APP_STREAM_BASE: u64 = 1 << 32;

struct Transmission {
    id: TxId,
    from: NodeId,
    frame: Frame,
}

pub struct WifiNetwork {
    seed: u64,
    node_count: usize,
    loss: MatrixLossModel,
    phy: PhyConfig,
    mac: MacConfig,
    /// 接收功率缓存（mW），按 from * n + to 索引
    rx_mw: Vec<f64>,
    cca_mw: f64,
    sensitivity_mw: f64,
    noise_mw: f64,
    min_sinr: f64,
    devices: Vec<Device>,
    apps: Vec<OnOffApp>,
    probes: Vec<ProbeConfig>,
    sinks: Vec<PacketSink>,
    active: Vec<Transmission>,
    next_tx_id: u64,
    next_pkt_id: u64,
}

impl WifiNetwork {
    pub fn new(seed: u64) -> Self {
        Self {
            seed,
            node_count: 0,
            loss: MatrixLossModel::default(),
            phy: PhyConfig::default(),
            mac: MacConfig::default(),
            rx_mw: Vec::new(),
            cca_mw: 0.0,
            sensitivity_mw: 0.0,
            noise_mw: 0.0,
            min_sinr: 0.0,
            devices: Vec::new(),
            apps: Vec::new(),
            probes: Vec::new(),
            sinks: Vec::new(),
            active: Vec::new(),
            next_tx_id: 0,
            next_pkt_id: 0,
        }
    }

    /// 设备安装后节点数固定，再加节点会使设备与增益矩阵失配
    pub fn create_nodes(&mut self, count: usize) -> Result<Vec<NodeId>> {
        if !self.devices.is_empty() {
            return Err(CdosError::ResourceConflict(
                "cannot add nodes after devices are installed".into(),
            ));
        }
        let first = self.node_count;
        self.node_count += count;
        Ok((first..self.node_count).map(NodeId).collect())
    }

    pub fn set_loss(&mut self, from: NodeId, to: NodeId, loss_db: f64) {
        self.loss.set_loss(from, to, loss_db);
        if !self.rx_mw.is_empty() {
            self.refresh_gains();
        }
    }

    pub fn set_default_loss(&mut self, loss_db: f64) {
        self.loss.set_default_loss(loss_db);
        if !self.rx_mw.is_empty() {
            self.refresh_gains();
        }
    }

    /// 给每个节点安装一个无线设备
    pub fn install_devices(&mut self, phy: &PhyConfig, mac: &MacConfig) -> Result<()> {
        if !self.devices.is_empty() {
            return Err(CdosError::ResourceConflict(
                "devices are already installed".into(),
            ));
        }
        if phy.data_rate_bps == 0 {
            return Err(CdosError::config("device data rate must be positive"));
        }
        if mac.retry_limit == 0 {
            return Err(CdosError::config("retry limit must be at least 1"));
        }
        self.phy = phy.clone();
        self.mac = mac.clone();
        self.cca_mw = dbm_to_mw(phy.cca_threshold_dbm);
        self.sensitivity_mw = dbm_to_mw(phy.rx_sensitivity_dbm);
        self.noise_mw = dbm_to_mw(phy.noise_floor_dbm);
        self.min_sinr = db_to_ratio(phy.min_snr_db);
        self.devices = (0..self.node_count)
            .map(|i| {
                let mut rng = ChaCha8Rng::seed_from_u64(self.seed);
                rng.set_stream(i as u64 + 1);
                Device::new(NodeId(i), self.node_count, mac.cw_min, rng)
            })
            .collect();
        self.refresh_gains();
        debug!(nodes = self.node_count, "📡 已安装无线设备");
        Ok(())
    }

    fn refresh_gains(&mut self) {
        let n = self.node_count;
        self.rx_mw = vec![0.0; n * n];
        for from in 0..n {
            for to in 0..n {
                if from != to {
                    let loss = self.loss.loss_db(NodeId(from), NodeId(to));
                    self.rx_mw[from * n + to] = dbm_to_mw(self.phy.tx_power_dbm - loss);
                }
            }
        }
    }

    fn rx_power(&self, from: NodeId, to: NodeId) -> f64 {
        self.rx_mw[from.0 * self.node_count + to.0]
    }

    fn device(&self, node: NodeId) -> Result<&Device> {
        self.devices.get(node.0).ok_or_else(|| {
            CdosError::config(format!("node {} has no device installed", node.0))
        })
    }

    pub fn install_sink(&mut self, node: NodeId, port: u16) -> Result<()> {
        self.device(node)?;
        if self
            .sinks
            .iter()
            .any(|s| s.stats.node == node && s.stats.port == port)
        {
            return Err(CdosError::ResourceConflict(format!(
                "port {port} already bound on node {}",
                node.0
            )));
        }
        self.sinks.push(PacketSink {
            stats: SinkStats::new(node, port),
        });
        Ok(())
    }

    pub fn install_on_off(
        &mut self,
        node: NodeId,
        cfg: &OnOffConfig,
        sim: &mut Simulator,
    ) -> Result<()> {
        self.device(node)?;
        self.device(cfg.remote)?;
        if cfg.data_rate_bps == 0 || cfg.packet_size_bytes == 0 {
            return Err(CdosError::config(
                "on/off data rate and packet size must be positive",
            ));
        }
        let interval = SimTime::from_secs_f64(
            cfg.packet_size_bytes as f64 * 8.0 / cfg.data_rate_bps as f64,
        );
        let idx = self.apps.len();
        let mut rng = ChaCha8Rng::seed_from_u64(self.seed);
        rng.set_stream(APP_STREAM_BASE + idx as u64);
        self.apps.push(OnOffApp {
            node,
            cfg: cfg.clone(),
            on: Sampler::new(cfg.on)?,
            off: Sampler::new(cfg.off)?,
            interval: interval.max(SimTime(1)),
            on_until: SimTime::ZERO,
            rng,
        });
        sim.schedule(
            cfg.start,
            AppStep {
                app: idx,
                phase: AppPhase::BeginOn,
            },
        );
        Ok(())
    }

    pub fn install_probe(
        &mut self,
        node: NodeId,
        cfg: &ProbeConfig,
        sim: &mut Simulator,
    ) -> Result<()> {
        self.device(node)?;
        self.device(cfg.remote)?;
        let idx = self.probes.len();
        self.probes.push(cfg.clone());
        sim.schedule(cfg.at, SendProbe { node, probe: idx });
        Ok(())
    }

    pub fn interface_stats(&self) -> Vec<InterfaceStats> {
        self.devices.iter().map(|d| d.stats.clone()).collect()
    }

    pub fn sink_stats(&self, node: NodeId, port: u16) -> Option<SinkStats> {
        self.sinks
            .iter()
            .find(|s| s.stats.node == node && s.stats.port == port)
            .map(|s| s.stats.clone())
    }

    pub(crate) fn sample_stats(&mut self, now: SimTime) {
        for d in &mut self.devices {
            d.stats.sample(now);
        }
    }

    // ---------------------------------------------------------------
    // 应用层
    // ---------------------------------------------------------------

    pub(crate) fn on_app_step(&mut self, app: usize, phase: AppPhase, sim: &mut Simulator) {
        let now = sim.now();
        match phase {
            AppPhase::BeginOn => {
                let (node, on) = {
                    let a = &mut self.apps[app];
                    let on = a.on.sample(&mut a.rng);
                    a.on_until = now.saturating_add(on);
                    (a.node, on)
                };
                if on == SimTime::ZERO {
                    self.on_app_step(app, AppPhase::EndOn, sim);
                    return;
                }
                trace!(app, ?on, "on 周期开始");
                self.app_send(app, node, sim);
            }
            AppPhase::Send => {
                let node = self.apps[app].node;
                self.app_send(app, node, sim);
            }
            AppPhase::EndOn => {
                let a = &mut self.apps[app];
                let off = a.off.sample(&mut a.rng);
                if off.is_forever() {
                    trace!(app, "off 周期无限长，源停止");
                    return;
                }
                sim.schedule(
                    now.saturating_add(off),
                    AppStep {
                        app,
                        phase: AppPhase::BeginOn,
                    },
                );
            }
        }
    }

    fn app_send(&mut self, app: usize, node: NodeId, sim: &mut Simulator) {
        let now = sim.now();
        let (pkt, next, on_until) = {
            let a = &self.apps[app];
            let pkt = Packet {
                id: self.next_pkt_id,
                src: node,
                dst: a.cfg.remote,
                port: a.cfg.port,
                size_bytes: a.cfg.packet_size_bytes,
            };
            (pkt, now.saturating_add(a.interval), a.on_until)
        };
        self.next_pkt_id += 1;
        self.enqueue(node, pkt, sim);

        if next < on_until {
            sim.schedule(
                next,
                AppStep {
                    app,
                    phase: AppPhase::Send,
                },
            );
        } else if !on_until.is_forever() {
            sim.schedule(
                on_until,
                AppStep {
                    app,
                    phase: AppPhase::EndOn,
                },
            );
        }
    }

    pub(crate) fn on_probe(&mut self, node: NodeId, probe: usize, sim: &mut Simulator) {
        let cfg = &self.probes[probe];
        let pkt = Packet {
            id: self.next_pkt_id,
            src: node,
            dst: cfg.remote,
            port: cfg.port,
            size_bytes: cfg.size_bytes,
        };
        self.next_pkt_id += 1;
        debug!(node = node.0, dst = cfg.remote.0, "🔎 发送探测包");
        self.enqueue(node, pkt, sim);
    }

    // ---------------------------------------------------------------
    // MAC
    // ---------------------------------------------------------------

    fn enqueue(&mut self, node: NodeId, pkt: Packet, sim: &mut Simulator) {
        let cap = self.mac.queue_capacity;
        let d = &mut self.devices[node.0];
        if d.queue.len() >= cap {
            d.stats.queue_drops += 1;
            trace!(node = node.0, pkt_id = pkt.id, "队列已满，丢弃");
            return;
        }
        d.queue.push_back(pkt);
        d.stats.enqueued += 1;
        if d.state == MacState::Idle {
            self.start_contention(node, sim);
        }
    }

    fn start_contention(&mut self, node: NodeId, sim: &mut Simulator) {
        let d = &mut self.devices[node.0];
        d.state = MacState::Contending;
        d.ensure_backoff();
        if !d.busy {
            self.resume_countdown(node, sim);
        }
    }

    /// 信道空闲：从 DIFS 结束（或现在）开始倒计时，预约接入事件
    fn resume_countdown(&mut self, node: NodeId, sim: &mut Simulator) {
        let slot = self.mac.slot;
        let difs = self.mac.difs();
        let d = &mut self.devices[node.0];
        if d.state != MacState::Contending {
            return;
        }
        let from = sim.now().max(d.idle_since.saturating_add(difs));
        let backoff = d.ensure_backoff();
        d.countdown_from = Some(from);
        d.access_gen = d.access_gen.wrapping_add(1);
        let at = from.saturating_add(slot.saturating_mul(backoff as u64));
        sim.schedule(
            at,
            TryAccess {
                node,
                epoch: d.access_gen,
            },
        );
    }

    pub(crate) fn on_try_access(&mut self, node: NodeId, epoch: u64, sim: &mut Simulator) {
        let d = &mut self.devices[node.0];
        if d.access_gen != epoch || d.state != MacState::Contending || d.busy {
            return;
        }
        let Some(pkt) = d.queue.front().cloned() else {
            d.state = MacState::Idle;
            return;
        };
        d.backoff = None;
        d.countdown_from = None;
        d.state = MacState::Transmitting;
        d.stats.tx_frames += 1;
        if d.attempts > 0 {
            d.stats.tx_retries += 1;
        }
        self.start_tx(node, Frame::Data(pkt), sim);
    }

    pub(crate) fn on_ack_timeout(&mut self, node: NodeId, epoch: u64, sim: &mut Simulator) {
        let cw_min = self.mac.cw_min;
        let cw_max = self.mac.cw_max;
        let limit = self.mac.retry_limit;
        let d = &mut self.devices[node.0];
        if d.ack_gen != epoch || d.state != MacState::WaitAck {
            return;
        }
        d.attempts += 1;
        if d.attempts >= limit {
            d.stats.tx_failed += 1;
            debug!(node = node.0, attempts = d.attempts, "达到重传上限，丢弃");
            d.finish_head(cw_min);
        } else {
            d.cw = (d.cw.saturating_mul(2) + 1).min(cw_max);
            d.backoff = None;
            d.state = MacState::Idle;
        }
        if !d.queue.is_empty() {
            self.start_contention(node, sim);
        }
    }

    pub(crate) fn on_send_ack(&mut self, node: NodeId, to: NodeId, pkt_id: u64, sim: &mut Simulator) {
        if self.devices[node.0].tx.is_some() {
            return;
        }
        self.devices[node.0].stats.acks_sent += 1;
        self.start_tx(node, Frame::Ack { to, pkt_id }, sim);
    }

    // ---------------------------------------------------------------
    // PHY / 信道
    // ---------------------------------------------------------------

    fn frame_bytes(&self, frame: &Frame) -> u32 {
        match frame {
            Frame::Data(pkt) => pkt.size_bytes.saturating_add(self.mac.overhead_bytes),
            Frame::Ack { .. } => self.mac.ack_bytes,
        }
    }

    fn interference(&self, at: NodeId, exclude: TxId) -> f64 {
        self.active
            .iter()
            .filter(|t| t.id != exclude && t.from != at)
            .map(|t| self.rx_power(t.from, at))
            .sum()
    }

    fn sensed_busy(&self, node: NodeId) -> bool {
        if self.devices[node.0].tx.is_some() {
            return true;
        }
        let total: f64 = self
            .active
            .iter()
            .filter(|t| t.from != node)
            .map(|t| self.rx_power(t.from, node))
            .sum();
        total >= self.cca_mw
    }

    fn start_tx(&mut self, from: NodeId, frame: Frame, sim: &mut Simulator) {
        let id = TxId(self.next_tx_id);
        self.next_tx_id += 1;
        let duration = self.phy.airtime(self.frame_bytes(&frame));
        trace!(from = from.0, tx_id = id.0, ?duration, "开始发送");

        {
            let d = &mut self.devices[from.0];
            d.tx = Some(id);
            // 半双工：发送会破坏正在进行的接收
            if let Some(rx) = d.rx.as_mut() {
                rx.corrupted = true;
            }
        }
        self.active.push(Transmission { id, from, frame });
        sim.schedule_in(duration, TxEnd { tx_id: id });

        for r in 0..self.node_count {
            let node = NodeId(r);
            if node == from {
                continue;
            }
            let power = self.rx_power(from, node);
            let current = self.devices[r].rx;
            match current {
                Some(lock) => {
                    let interf = self.interference(node, lock.tx_id);
                    if let Some(rx) = self.devices[r].rx.as_mut() {
                        rx.max_interference_mw = rx.max_interference_mw.max(interf);
                    }
                }
                None if self.devices[r].tx.is_none() && power >= self.sensitivity_mw => {
                    let interf = self.interference(node, id);
                    self.devices[r].rx = Some(RxLock {
                        tx_id: id,
                        signal_mw: power,
                        max_interference_mw: interf,
                        corrupted: false,
                    });
                }
                None => {}
            }
        }
        self.refresh_carrier(sim);
    }

    pub(crate) fn on_tx_end(&mut self, tx_id: TxId, sim: &mut Simulator) {
        let Some(pos) = self.active.iter().position(|t| t.id == tx_id) else {
            return;
        };
        let tx = self.active.remove(pos);
        self.devices[tx.from.0].tx = None;

        for r in 0..self.node_count {
            let lock = match self.devices[r].rx {
                Some(lock) if lock.tx_id == tx_id => lock,
                _ => continue,
            };
            self.devices[r].rx = None;
            let sinr = lock.signal_mw / (self.noise_mw + lock.max_interference_mw);
            if !lock.corrupted && sinr >= self.min_sinr {
                self.on_frame_received(NodeId(r), tx.from, &tx.frame, sim);
            } else {
                self.devices[r].stats.rx_errors += 1;
                trace!(node = r, tx_id = tx_id.0, sinr, "接收失败");
            }
        }

        if let Frame::Data(_) = tx.frame {
            let timeout = self
                .mac
                .sifs
                .saturating_add(self.phy.airtime(self.mac.ack_bytes))
                .saturating_add(self.mac.slot);
            let d = &mut self.devices[tx.from.0];
            d.state = MacState::WaitAck;
            d.ack_gen = d.ack_gen.wrapping_add(1);
            sim.schedule_in(
                timeout,
                AckTimeout {
                    node: tx.from,
                    epoch: d.ack_gen,
                },
            );
        }

        self.refresh_carrier(sim);
    }

    fn on_frame_received(&mut self, at: NodeId, from: NodeId, frame: &Frame, sim: &mut Simulator) {
        if frame.dst() != at {
            self.devices[at.0].stats.rx_overheard += 1;
            return;
        }
        match frame {
            Frame::Data(pkt) => {
                let sifs = self.mac.sifs;
                sim.schedule_in(
                    sifs,
                    SendAck {
                        node: at,
                        to: from,
                        pkt_id: pkt.id,
                    },
                );
                let d = &mut self.devices[at.0];
                d.stats.rx_ok += 1;
                if d.last_rx[from.0] == Some(pkt.id) {
                    d.stats.rx_duplicates += 1;
                    return;
                }
                d.last_rx[from.0] = Some(pkt.id);
                d.stats.rx_bytes += pkt.size_bytes as u64;
                let now = sim.now();
                match self
                    .sinks
                    .iter_mut()
                    .find(|s| s.stats.node == at && s.stats.port == pkt.port)
                {
                    Some(sink) => sink.stats.record(pkt.size_bytes, now),
                    None => self.devices[at.0].stats.rx_unbound += 1,
                }
            }
            Frame::Ack { pkt_id, .. } => {
                let cw_min = self.mac.cw_min;
                let d = &mut self.devices[at.0];
                let head = d.queue.front().map(|p| p.id);
                if d.state != MacState::WaitAck || head != Some(*pkt_id) {
                    return;
                }
                d.ack_gen = d.ack_gen.wrapping_add(1);
                d.stats.tx_ok += 1;
                d.finish_head(cw_min);
                if !d.queue.is_empty() {
                    self.start_contention(at, sim);
                }
            }
        }
    }

    /// 重新计算每个设备的载波侦听状态，处理忙/闲切换
    fn refresh_carrier(&mut self, sim: &mut Simulator) {
        let now = sim.now();
        let slot = self.mac.slot;
        for r in 0..self.node_count {
            let node = NodeId(r);
            let busy = self.sensed_busy(node);
            let d = &mut self.devices[r];
            if busy == d.busy {
                continue;
            }
            d.busy = busy;
            if busy {
                d.freeze(now, slot);
            } else {
                d.idle_since = now;
                self.resume_countdown(node, sim);
            }
        }
    }
}
