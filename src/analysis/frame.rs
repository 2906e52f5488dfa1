// FrameAssembler - sliding analysis window over the sample ring
//
// First call blocks for a full frame. Every later call shifts the window left
// by one hop and blocks for exactly one hop of fresh samples, so consecutive
// frames overlap by frame_len - hop_len samples.

use std::sync::atomic::AtomicBool;

use crate::audio::RingConsumer;

pub struct FrameAssembler {
    frame: Vec<i16>,
    hop: Vec<i16>,
    hop_len: usize,
    primed: bool,
    samples_consumed: u64,
}

impl FrameAssembler {
    /// # Panics
    /// Panics if `hop_len` is zero or longer than `frame_len`
    pub fn new(frame_len: usize, hop_len: usize) -> Self {
        assert!(
            hop_len > 0 && hop_len <= frame_len,
            "hop length must be in 1..=frame_len"
        );
        Self {
            frame: vec![0; frame_len],
            hop: vec![0; hop_len],
            hop_len,
            primed: false,
            samples_consumed: 0,
        }
    }

    pub fn frame_len(&self) -> usize {
        self.frame.len()
    }

    pub fn hop_len(&self) -> usize {
        self.hop_len
    }

    /// True once the first full frame has been read.
    pub fn is_primed(&self) -> bool {
        self.primed
    }

    /// Total samples pulled from the ring so far.
    pub fn samples_consumed(&self) -> u64 {
        self.samples_consumed
    }

    /// Block until the next frame is complete and return it.
    pub fn next_frame(&mut self, ring: &mut RingConsumer) -> &[i16] {
        if !self.primed {
            ring.pop_block(&mut self.frame);
            self.primed = true;
            self.samples_consumed += self.frame.len() as u64;
        } else {
            let tail = self.slide();
            ring.pop_block(&mut self.frame[tail..]);
            self.samples_consumed += self.hop_len as u64;
        }
        &self.frame
    }

    /// Like [`next_frame`](Self::next_frame), but returns `None` if
    /// `running` is cleared while waiting. The window is left untouched in
    /// that case.
    pub fn next_frame_until(
        &mut self,
        ring: &mut RingConsumer,
        running: &AtomicBool,
    ) -> Option<&[i16]> {
        if !self.primed {
            if !ring.pop_block_until(&mut self.frame, running) {
                return None;
            }
            self.primed = true;
            self.samples_consumed += self.frame.len() as u64;
            return Some(&self.frame);
        }

        // Land the hop in scratch first so an abandoned wait leaves the
        // window untouched.
        if !ring.pop_block_until(&mut self.hop, running) {
            return None;
        }
        let tail = self.slide();
        self.frame[tail..].copy_from_slice(&self.hop);
        self.samples_consumed += self.hop_len as u64;
        Some(&self.frame)
    }

    fn slide(&mut self) -> usize {
        let frame_len = self.frame.len();
        self.frame.copy_within(self.hop_len.., 0);
        frame_len - self.hop_len
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::RingBuffer;

    #[test]
    fn test_priming_reads_full_frame() {
        let (mut producer, mut consumer) = RingBuffer::new(64);
        for s in 0..10 {
            producer.push(s);
        }
        let mut assembler = FrameAssembler::new(8, 4);
        assert!(!assembler.is_primed());

        let frame = assembler.next_frame(&mut consumer).to_vec();
        assert_eq!(frame, vec![0, 1, 2, 3, 4, 5, 6, 7]);
        assert!(assembler.is_primed());
        assert_eq!(assembler.samples_consumed(), 8);
        assert_eq!(consumer.available(), 2);
    }

    #[test]
    fn test_hops_overlap() {
        let (mut producer, mut consumer) = RingBuffer::new(64);
        for s in 0..16 {
            producer.push(s);
        }
        let mut assembler = FrameAssembler::new(8, 4);

        assembler.next_frame(&mut consumer);
        let second = assembler.next_frame(&mut consumer).to_vec();
        assert_eq!(second, vec![4, 5, 6, 7, 8, 9, 10, 11]);
        let third = assembler.next_frame(&mut consumer).to_vec();
        assert_eq!(third, vec![8, 9, 10, 11, 12, 13, 14, 15]);
        assert_eq!(assembler.samples_consumed(), 16);
    }

    #[test]
    fn test_hop_equal_to_frame_is_disjoint() {
        let (mut producer, mut consumer) = RingBuffer::new(64);
        for s in 0..12 {
            producer.push(s);
        }
        let mut assembler = FrameAssembler::new(6, 6);
        assert_eq!(assembler.next_frame(&mut consumer), &[0, 1, 2, 3, 4, 5]);
        assert_eq!(assembler.next_frame(&mut consumer), &[6, 7, 8, 9, 10, 11]);
    }

    #[test]
    fn test_never_yields_short_frame_when_stopped() {
        let (mut producer, mut consumer) = RingBuffer::new(64);
        for s in 0..5 {
            producer.push(s);
        }
        let running = AtomicBool::new(false);
        let mut assembler = FrameAssembler::new(8, 4);
        assert!(assembler.next_frame_until(&mut consumer, &running).is_none());
        assert!(!assembler.is_primed());
        assert_eq!(consumer.available(), 5);
    }

    #[test]
    fn test_abandoned_hop_keeps_window() {
        let (mut producer, mut consumer) = RingBuffer::new(64);
        for s in 0..10 {
            producer.push(s);
        }
        let running = AtomicBool::new(true);
        let mut assembler = FrameAssembler::new(8, 4);
        let first = assembler
            .next_frame_until(&mut consumer, &running)
            .map(|f| f.to_vec());
        assert_eq!(first, Some(vec![0, 1, 2, 3, 4, 5, 6, 7]));

        running.store(false, std::sync::atomic::Ordering::Release);
        assert!(assembler.next_frame_until(&mut consumer, &running).is_none());
        assert_eq!(assembler.samples_consumed(), 8);

        // Resuming continues from the same window
        producer.push(10);
        producer.push(11);
        running.store(true, std::sync::atomic::Ordering::Release);
        let next = assembler
            .next_frame_until(&mut consumer, &running)
            .map(|f| f.to_vec());
        assert_eq!(next, Some(vec![4, 5, 6, 7, 8, 9, 10, 11]));
    }

    #[test]
    #[should_panic(expected = "hop length")]
    fn test_zero_hop_panics() {
        FrameAssembler::new(8, 0);
    }
}
