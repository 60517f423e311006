//! Per-channel decode pipeline.
//!
//! Samples flow through symbol recovery, the frame assembler, and the frame parser in
//! order on a single thread, and decoded messages are handed off through a bounded
//! queue. The queue never applies backpressure: if the consumer falls behind, new
//! messages are dropped so sample consumption never stalls.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;

use crossbeam_channel::{bounded, Receiver, Sender, TrySendError};
use tracing::{debug, trace, warn};

use crate::baseband::fsk::FskDecoder;
use crate::config::Config;
use crate::error::{P25Error, Result};
use crate::framer::{Frame, MessageFramer, P25Layout};
use crate::message::{FrameParser, Message};
use crate::stats::{HasStats, Stats};
use crate::trunking::BandTable;

/// Decodes the samples of a single channel into messages.
pub struct Pipeline {
    fsk: FskDecoder,
    framer: MessageFramer<P25Layout>,
    parser: FrameParser,
    /// Band parameters advertised on the channel so far.
    bands: BandTable,
    sink: Sender<Message>,
    cancel: Arc<AtomicBool>,
    stats: Stats,
    /// Number of messages dropped because the queue was full.
    dropped: usize,
    /// Whether the consumer side of the queue has hung up.
    closed: bool,
    /// Scratch buffer of recovered bits.
    bits: Vec<bool>,
}

impl Pipeline {
    /// Create a new `Pipeline` delivering messages into the given queue.
    pub fn new(config: &Config, sink: Sender<Message>) -> Result<Pipeline> {
        config.validate()?;

        Ok(Pipeline {
            fsk: FskDecoder::new(config.sample_rate, config.symbol_rate, config.polarity)?,
            framer: MessageFramer::new(P25Layout, config.sync_tolerance)?,
            parser: FrameParser::new(config.direction),
            bands: BandTable::new(),
            sink,
            cancel: Arc::new(AtomicBool::new(false)),
            stats: Stats::default(),
            dropped: 0,
            closed: false,
            bits: Vec::new(),
        })
    }

    /// Flag that stops the pipeline at the next buffer boundary once set.
    pub fn cancel_handle(&self) -> Arc<AtomicBool> { self.cancel.clone() }

    pub fn is_cancelled(&self) -> bool { self.cancel.load(Ordering::Relaxed) }

    pub fn bands(&self) -> &BandTable { &self.bands }

    /// Number of messages dropped because the queue was full.
    pub fn dropped(&self) -> usize { self.dropped }

    /// Whether the message consumer has disconnected.
    pub fn is_closed(&self) -> bool { self.closed }

    pub fn stats(&self) -> &Stats { &self.stats }

    /// Decode a buffer of baseband samples, returning the number of messages queued.
    pub fn push_samples(&mut self, samples: &[f32]) -> usize {
        if self.is_cancelled() {
            return 0;
        }

        let mut bits = std::mem::take(&mut self.bits);
        bits.clear();

        self.fsk.feed_all(samples, &mut bits);
        let sent = self.deliver_bits(&bits);

        self.bits = bits;
        sent
    }

    /// Decode a buffer of already recovered bits, returning the number of messages
    /// queued.
    pub fn push_bits(&mut self, bits: &[bool]) -> usize {
        if self.is_cancelled() {
            return 0;
        }

        self.deliver_bits(bits)
    }

    /// Force out any partially assembled frames, such as at the end of a stream.
    pub fn flush(&mut self) -> usize {
        let frames = self.framer.flush();
        self.deliver(frames)
    }

    /// Drop all in-flight frames, sample history, and band parameters.
    pub fn reset(&mut self) {
        debug!(pending = self.framer.pending(), "resetting pipeline");

        self.framer.reset();
        self.fsk.reset();
        self.bands.clear();
    }

    fn deliver_bits(&mut self, bits: &[bool]) -> usize {
        let frames = self.framer.feed_bits(bits.iter().cloned());
        self.deliver(frames)
    }

    fn deliver(&mut self, frames: Vec<Frame>) -> usize {
        let mut sent = 0;

        for frame in frames {
            trace!(len = frame.bits.len(), sync_errors = frame.sync_errors,
                   complete = frame.complete, "frame assembled");

            for msg in self.parser.parse(&frame) {
                if let Some((id, params)) = msg.band_update() {
                    debug!(id, ?params, "band update");
                    self.bands.update(id, params);
                }

                match self.sink.try_send(msg) {
                    Ok(()) => sent += 1,
                    Err(TrySendError::Full(msg)) => {
                        self.dropped += 1;
                        warn!(msg = %msg, dropped = self.dropped,
                              "message queue full, dropping message");
                    },
                    Err(TrySendError::Disconnected(_)) => {
                        if !self.closed {
                            debug!("message queue disconnected");
                        }

                        self.closed = true;
                    },
                }
            }
        }

        self.stats.merge(&mut self.parser);
        sent
    }

    /// Decode every sample buffer from the given queue until it's drained, the
    /// pipeline is cancelled, or the message consumer disconnects.
    pub fn run(&mut self, samples: Receiver<Vec<f32>>) -> Result<Stats> {
        for buf in samples.iter() {
            if self.is_cancelled() {
                debug!("pipeline cancelled");
                self.reset();
                return Ok(self.stats);
            }

            self.push_samples(&buf);

            if self.closed {
                return Err(P25Error::QueueClosed);
            }
        }

        self.flush();

        Ok(self.stats)
    }
}

/// A pipeline running on its own thread.
pub struct SpawnedChannel {
    /// Resolves to the pipeline's final counters once its sample queue drains.
    pub handle: thread::JoinHandle<Result<Stats>>,
    /// Stops the pipeline at the next buffer boundary once set.
    pub cancel: Arc<AtomicBool>,
    /// Decoded messages, buffered up to the configured queue capacity.
    pub messages: Receiver<Message>,
}

/// Run a pipeline for the given channel on its own thread, delivering messages into a
/// new queue holding up to `config.queue_capacity` of them.
pub fn spawn_channel(config: &Config, samples: Receiver<Vec<f32>>)
    -> Result<SpawnedChannel>
{
    config.validate()?;

    let (sink, messages) = bounded(config.queue_capacity);
    let mut pipeline = Pipeline::new(config, sink)?;
    let cancel = pipeline.cancel_handle();

    debug!(capacity = config.queue_capacity, "spawning channel");
    let handle = thread::spawn(move || pipeline.run(samples));

    Ok(SpawnedChannel { handle, cancel, messages })
}

#[cfg(test)]
mod test {
    use super::*;

    use crate::consts::SYNC_BITS;
    use crate::framer::test_frames;
    use crate::message::nid::DataUnit;
    use crate::sync::P25_SYNC;
    use crate::message::tsbk::TsbkFields;
    use crate::test_util::{modulate, setup_logging};

    fn grant() -> TsbkFields {
        TsbkFields {
            last_block: true,
            protected: false,
            opcode: 0x00,
            vendor: 0x00,
            payload: 0x00_1009_0101_123456,
        }
    }

    fn band_update() -> TsbkFields {
        TsbkFields {
            last_block: true,
            opcode: 0x3D,
            payload: 1 << 60 | 0x64 << 51 | 0b010110100 << 42 | 0x32 << 32 | 170201250,
            ..TsbkFields::default()
        }
    }

    /// Transmitted bits of a trunking frame, with leading idle bits.
    fn tx(blocks: &[TsbkFields]) -> Vec<bool> {
        let coded = blocks.iter().map(|b| b.encode()).collect::<Vec<_>>();
        let body = test_frames::concat(&coded.iter().collect::<Vec<_>>());
        let frame = test_frames::frame(0x293, DataUnit::TrunkingSignaling, &body);

        let mut bits = vec![false; 24];
        bits.extend(test_frames::with_status(&frame));
        bits.extend(vec![false; 24]);
        bits
    }

    #[test]
    fn test_bits() {
        setup_logging();

        let (tx_msgs, rx_msgs) = bounded(16);
        let mut p = Pipeline::new(&Config::default(), tx_msgs).unwrap();

        assert_eq!(p.push_bits(&tx(&[band_update()])), 1);
        assert_eq!(p.bands().len(), 1);

        assert_eq!(p.push_bits(&tx(&[grant()])), 1);
        assert_eq!(rx_msgs.len(), 2);

        let _ = rx_msgs.recv().unwrap();
        let msg = rx_msgs.recv().unwrap();

        assert!(msg.is_valid());
        assert_eq!(msg.opcode_tag(), "GRP_V_CH_GRANT");
        assert_eq!(msg.resolve(p.bands())[0].value, 851_062_500);

        assert_eq!(p.stats().frames, 2);
        assert_eq!(p.stats().bch.words(), 2);
        assert_eq!(p.dropped(), 0);
    }

    #[test]
    fn test_overflow() {
        setup_logging();

        let (tx_msgs, rx_msgs) = bounded(1);
        let mut p = Pipeline::new(&Config::default(), tx_msgs).unwrap();

        let mut first = grant();
        first.last_block = false;

        assert_eq!(p.push_bits(&tx(&[first, grant()])), 1);
        assert_eq!(p.dropped(), 1);
        assert_eq!(rx_msgs.len(), 1);
        assert!(!p.is_closed());

        drop(rx_msgs);
        assert_eq!(p.push_bits(&tx(&[grant()])), 0);
        assert!(p.is_closed());
    }

    #[test]
    fn test_flush_reset() {
        let (tx_msgs, rx_msgs) = bounded(16);
        let mut p = Pipeline::new(&Config::default(), tx_msgs).unwrap();

        let bits = tx(&[grant()]);
        // Stop partway through the block.
        assert_eq!(p.push_bits(&bits[..24 + 200]), 0);
        assert_eq!(p.flush(), 1);
        assert!(!rx_msgs.recv().unwrap().is_valid());

        p.push_bits(&tx(&[band_update()]));
        p.push_bits(&bits[..24 + 200]);
        p.reset();

        assert!(p.bands().is_empty());
        assert_eq!(p.flush(), 0);
    }

    #[test]
    fn test_cancel() {
        let (tx_msgs, rx_msgs) = bounded(16);
        let mut p = Pipeline::new(&Config::default(), tx_msgs).unwrap();

        p.cancel_handle().store(true, Ordering::Relaxed);
        assert!(p.is_cancelled());
        assert_eq!(p.push_bits(&tx(&[grant()])), 0);
        assert_eq!(p.push_samples(&modulate(&tx(&[grant()]), 10)), 0);
        assert!(rx_msgs.is_empty());
    }

    #[test]
    fn test_config() {
        let (tx_msgs, _rx) = bounded(1);
        let mut cfg = Config::default();
        cfg.sample_rate = 44100;

        assert!(matches!(Pipeline::new(&cfg, tx_msgs),
                         Err(P25Error::SamplesPerSymbol { .. })));
    }

    #[test]
    fn test_sync_only() {
        setup_logging();

        let (tx_msgs, rx_msgs) = bounded(16);
        let mut p = Pipeline::new(&Config::default(), tx_msgs).unwrap();

        // Transmission cut off right after the sync pattern.
        let mut bits = vec![false; 24];
        bits.extend((0..SYNC_BITS).rev().map(|i| P25_SYNC >> i & 1 == 1));

        assert_eq!(p.push_bits(&bits), 0);
        assert_eq!(p.flush(), 1);

        let msg = rx_msgs.recv().unwrap();
        assert!(!msg.is_valid());
        assert_eq!(msg.opcode_tag(), "NID");
        assert_eq!(p.stats().bch.failed(), 1);
    }

    #[test]
    fn test_spawn() {
        setup_logging();

        let (tx_samples, rx_samples) = bounded(4);
        let mut cfg = Config::default();
        cfg.queue_capacity = 16;

        let chan = spawn_channel(&cfg, rx_samples).unwrap();
        assert_eq!(chan.messages.capacity(), Some(16));

        let mut update = band_update();
        update.last_block = false;
        let samples = modulate(&tx(&[update, grant()]), 10);

        for chunk in samples.chunks(1000) {
            tx_samples.send(chunk.to_vec()).unwrap();
        }

        drop(tx_samples);

        let stats = chan.handle.join().unwrap().unwrap();
        assert_eq!(stats.frames, 1);

        let msgs = chan.messages.try_iter().collect::<Vec<_>>();
        assert_eq!(msgs.len(), 2);
        assert!(msgs.iter().all(|m| m.is_valid()));
        assert_eq!(msgs[0].band_update().map(|(id, _)| id), Some(1));
        assert_eq!(msgs[1].opcode_tag(), "GRP_V_CH_GRANT");
    }

    #[test]
    fn test_spawn_closed() {
        let (tx_samples, rx_samples) = bounded(4);

        let chan = spawn_channel(&Config::default(), rx_samples).unwrap();
        drop(chan.messages);

        let samples = modulate(&tx(&[grant()]), 10);
        tx_samples.send(samples).unwrap();
        drop(tx_samples);

        assert_eq!(chan.handle.join().unwrap(), Err(P25Error::QueueClosed));
    }

    #[test]
    fn test_spawn_config() {
        let (_tx, rx_samples) = bounded(1);
        let mut cfg = Config::default();
        cfg.queue_capacity = 0;

        assert!(matches!(spawn_channel(&cfg, rx_samples), Err(P25Error::EmptyQueue)));
    }
}
