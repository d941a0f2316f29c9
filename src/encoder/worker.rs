//! Encode thread body

use std::sync::atomic::Ordering;
use std::sync::Arc;

use super::bridge::OutputWriter;
use super::{EncoderState, HeadState, OutputItem, Shared};
use crate::audio::Buffer;
use crate::mux::Muxer;
use crate::sink::{Sink, SinkRead};

pub(super) fn run(shared: Arc<Shared>, sink: Sink, mut muxer: Box<dyn Muxer>) {
    tracing::debug!("encode thread started");

    loop {
        if !shared.header_written.load(Ordering::SeqCst) {
            write_header(&shared, muxer.as_mut());
        }

        match sink.get_buffer(true) {
            SinkRead::Buffer(buffer) => {
                let mut head = shared.head.lock();
                head.item = buffer.item();
                head.position = buffer.position();
                head.format = *buffer.format();
                encode(&shared, &mut head, muxer.as_mut(), Some(&buffer));
            }
            SinkRead::End => finish_segment(&shared, muxer.as_mut()),
            SinkRead::NoData => break,
        }
    }

    tracing::debug!("encode thread exiting");
}

fn write_header(shared: &Shared, muxer: &mut dyn Muxer) {
    tracing::info!("encoder: writing header");
    let tag = shared.head.lock().tag();

    let mut writer = OutputWriter::new(&shared.queue, &shared.counters, tag);
    if let Err(e) = muxer.write_header(&mut writer) {
        tracing::error!("could not write header: {}", e);
        shared.counters.write_errors.fetch_add(1, Ordering::Relaxed);
    }

    shared.header_written.store(true, Ordering::SeqCst);
    shared.set_state(EncoderState::Streaming);
}

/// Feed `frame` (or a drain request) to the codec and mux every packet it
/// produces. Returns the number of packets muxed.
fn encode(shared: &Shared, head: &mut HeadState, muxer: &mut dyn Muxer, frame: Option<&Buffer>) -> usize {
    let tag = head.tag();
    let Some(codec) = head.codec.as_mut() else {
        return 0;
    };

    if let Err(e) = codec.send_frame(frame) {
        tracing::warn!("error encoding audio frame: {}", e);
        if frame.is_some() {
            shared.counters.frames_dropped.fetch_add(1, Ordering::Relaxed);
        }
        return 0;
    }
    if frame.is_some() {
        shared.counters.frames_encoded.fetch_add(1, Ordering::Relaxed);
    }

    let mut writer = OutputWriter::new(&shared.queue, &shared.counters, tag);
    let mut muxed = 0;
    loop {
        match codec.receive_packet() {
            Ok(Some(packet)) => {
                muxed += 1;
                shared.counters.packets_written.fetch_add(1, Ordering::Relaxed);
                if let Err(e) = muxer.write_packet(&packet, &mut writer) {
                    tracing::error!("error writing packet: {}", e);
                    shared.counters.write_errors.fetch_add(1, Ordering::Relaxed);
                }
            }
            Ok(None) => break,
            Err(e) => {
                tracing::warn!("error receiving packet: {}", e);
                break;
            }
        }
    }
    muxed
}

fn finish_segment(shared: &Shared, muxer: &mut dyn Muxer) {
    shared.set_state(EncoderState::Flushing);

    {
        let mut head = shared.head.lock();
        let drained = encode(shared, &mut head, muxer, None);
        tracing::debug!("encoder: drained {} packets", drained);

        let mut writer = OutputWriter::new(&shared.queue, &shared.counters, head.tag());
        loop {
            match muxer.flush(&mut writer) {
                Ok(true) => continue,
                Ok(false) => break,
                Err(e) => {
                    tracing::error!("error flushing muxer: {}", e);
                    shared.counters.write_errors.fetch_add(1, Ordering::Relaxed);
                    break;
                }
            }
        }

        head.clear();
    }

    tracing::info!("encoder: writing trailer");
    let tag = shared.head.lock().tag();
    let mut writer = OutputWriter::new(&shared.queue, &shared.counters, tag);
    if let Err(e) = muxer.write_trailer(&mut writer) {
        tracing::error!("could not write trailer: {}", e);
        shared.counters.write_errors.fetch_add(1, Ordering::Relaxed);
    }

    shared.queue.put(OutputItem::EndOfStream);
    shared.header_written.store(false, Ordering::SeqCst);
    shared.counters.segments_completed.fetch_add(1, Ordering::Relaxed);
    shared.set_state(EncoderState::HeaderPending);
}
