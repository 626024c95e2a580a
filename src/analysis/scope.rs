use std::sync::{Arc, Mutex, MutexGuard, TryLockError};

/// Fixed-size history of the most recent samples of a stream.
struct Window {
    samples: Vec<f32>,
    head: usize,
}

impl Window {
    fn push(&mut self, sample: f32) {
        self.samples[self.head] = sample;
        self.head = (self.head + 1) % self.samples.len();
    }
}

/// Audio-callback half. Never blocks: if the reader holds the lock, the
/// block is skipped and the window simply misses it.
pub struct ScopeWriter {
    window: Arc<Mutex<Window>>,
}

/// Control-side half.
#[derive(Clone)]
pub struct ScopeReader {
    window: Arc<Mutex<Window>>,
}

/// Create a scope holding the latest `capacity` samples, initially silent.
pub fn scope(capacity: usize) -> (ScopeWriter, ScopeReader) {
    let window = Arc::new(Mutex::new(Window {
        samples: vec![0.0; capacity.max(1)],
        head: 0,
    }));
    (
        ScopeWriter {
            window: window.clone(),
        },
        ScopeReader { window },
    )
}

impl ScopeWriter {
    /// Append samples, overwriting the oldest once the window is full.
    pub fn write(&mut self, samples: impl IntoIterator<Item = f32>) {
        let mut window = match self.window.try_lock() {
            Ok(window) => window,
            Err(TryLockError::Poisoned(poisoned)) => poisoned.into_inner(),
            Err(TryLockError::WouldBlock) => return,
        };
        for sample in samples {
            window.push(sample);
        }
    }

    /// Append the mono downmix `(l + r) / 2` of a stereo block.
    pub fn write_stereo(&mut self, left: &[f32], right: &[f32]) {
        self.write(left.iter().zip(right).map(|(&l, &r)| 0.5 * (l + r)));
    }

    /// True once every reader has been dropped.
    pub fn is_abandoned(&self) -> bool {
        Arc::strong_count(&self.window) == 1
    }
}

impl ScopeReader {
    /// The newest `len` samples, oldest first. Shorter requests are
    /// truncated from the old end; longer ones are front-padded with zeros.
    pub fn snapshot(&self, len: usize) -> Vec<f32> {
        let window = self.lock();
        let capacity = window.samples.len();
        let take = len.min(capacity);

        let mut out = vec![0.0; len - take];
        out.reserve(take);
        let start = (window.head + capacity - take) % capacity;
        out.extend((0..take).map(|i| window.samples[(start + i) % capacity]));
        out
    }

    pub fn capacity(&self) -> usize {
        self.lock().samples.len()
    }

    fn lock(&self) -> MutexGuard<'_, Window> {
        self.window
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn snapshot_is_chronological() {
        let (mut writer, reader) = scope(4);
        writer.write_stereo(&[1.0, 2.0, 3.0], &[1.0, 2.0, 3.0]);
        writer.write_stereo(&[4.0, 5.0], &[4.0, 5.0]);

        assert_eq!(reader.snapshot(4), vec![2.0, 3.0, 4.0, 5.0]);
        assert_eq!(reader.snapshot(2), vec![4.0, 5.0]);
    }

    #[test]
    fn downmixes_and_pads() {
        let (mut writer, reader) = scope(8);
        writer.write_stereo(&[1.0], &[0.0]);

        let snapshot = reader.snapshot(10);
        assert_eq!(snapshot.len(), 10);
        assert_eq!(snapshot[9], 0.5);
        assert!(snapshot[..9].iter().all(|&s| s == 0.0));
    }

    #[test]
    fn overwrites_oldest_when_full() {
        let (mut writer, reader) = scope(3);
        writer.write((1..=10).map(|i| i as f32));
        assert_eq!(reader.snapshot(3), vec![8.0, 9.0, 10.0]);

        assert!(!writer.is_abandoned());
        drop(reader);
        assert!(writer.is_abandoned());
    }

    #[test]
    fn writer_skips_while_reader_holds_lock() {
        let (mut writer, reader) = scope(2);
        {
            let _guard = reader.lock();
            writer.write_stereo(&[1.0], &[1.0]);
        }
        assert_eq!(reader.snapshot(2), vec![0.0, 0.0]);
    }
}
