//! Muxer output path
//!
//! [`OutputWriter`] is the `Write` target handed to the muxer. Every write
//! becomes one packet buffer on the output queue, tagged with the head
//! snapshot the writer was built with.

use std::io::{self, Write};

use super::{Counters, OutputItem};
use crate::audio::{AudioFormat, Buffer, ItemId};
use crate::queue::Queue;

/// Metadata stamped on every output buffer
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct Tag {
    pub item: Option<ItemId>,
    pub position: f64,
    pub format: AudioFormat,
}

pub(crate) struct OutputWriter<'a> {
    queue: &'a Queue<OutputItem>,
    counters: &'a Counters,
    tag: Tag,
}

impl<'a> OutputWriter<'a> {
    pub fn new(queue: &'a Queue<OutputItem>, counters: &'a Counters, tag: Tag) -> Self {
        Self { queue, counters, tag }
    }
}

impl Write for OutputWriter<'_> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        if buf.is_empty() {
            return Ok(0);
        }

        let mut data = Vec::new();
        if data.try_reserve_exact(buf.len()).is_err() {
            tracing::error!("unable to allocate {} byte output buffer", buf.len());
            return Err(io::Error::new(
                io::ErrorKind::OutOfMemory,
                "unable to allocate output buffer",
            ));
        }
        data.extend_from_slice(buf);

        self.counters.record_output(buf.len());
        self.queue.put(OutputItem::Packet(Buffer::packet(
            self.tag.item,
            self.tag.position,
            self.tag.format,
            data,
        )));
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::BufferKind;
    use crate::queue::QueueRead;

    #[test]
    fn test_each_write_becomes_tagged_buffer() {
        let queue = Queue::new();
        let counters = Counters::default();
        let tag = Tag {
            item: Some(ItemId::new(4)),
            position: 12.5,
            format: AudioFormat::default(),
        };

        let mut writer = OutputWriter::new(&queue, &counters, tag);
        writer.write_all(b"abc").unwrap();
        writer.write_all(b"defg").unwrap();

        assert_eq!(queue.len(), 2);
        match queue.get(false) {
            QueueRead::Item(OutputItem::Packet(buffer)) => {
                assert_eq!(buffer.kind(), BufferKind::Packet);
                assert_eq!(buffer.item(), Some(ItemId::new(4)));
                assert_eq!(buffer.position(), 12.5);
                assert_eq!(buffer.data().as_ref(), b"abc");
            }
            _ => panic!("expected a packet"),
        }
        assert_eq!(counters.snapshot().bytes_out, 7);
    }

    #[test]
    fn test_empty_write_enqueues_nothing() {
        let queue = Queue::new();
        let counters = Counters::default();
        let tag = Tag {
            item: None,
            position: -1.0,
            format: AudioFormat::default(),
        };

        let mut writer = OutputWriter::new(&queue, &counters, tag);
        assert_eq!(writer.write(&[]).unwrap(), 0);
        assert!(queue.is_empty());
    }
}
