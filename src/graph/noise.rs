use std::sync::Arc;

use crate::graph::node::{GraphNode, RenderCtx};

/// One-shot player for a shared noise buffer.
///
/// Plays the buffer once and then
/// outputs silence. The buffer is shared between voices; each burst only
/// owns its read position.
pub struct NoiseBurst {
    buffer: Arc<[f32]>,
    position: usize,
}

impl NoiseBurst {
    pub fn new(buffer: Arc<[f32]>) -> Self {
        Self {
            buffer,
            position: 0,
        }
    }

    pub fn remaining(&self) -> usize {
        self.buffer.len() - self.position
    }
}

impl GraphNode for NoiseBurst {
    fn render_block(&mut self, out: &mut [f32], _ctx: &RenderCtx) {
        let available = &self.buffer[self.position..];
        let n = available.len().min(out.len());
        out[..n].copy_from_slice(&available[..n]);
        out[n..].fill(0.0);
        self.position += n;
    }

    fn note_on(&mut self, _time: f64) {
        self.position = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plays_once_then_silence() {
        let buffer: Arc<[f32]> = Arc::from(vec![0.5f32; 100]);
        let mut burst = NoiseBurst::new(buffer);
        let ctx = RenderCtx::from_freq(1_000.0, 440.0);

        let mut out = vec![1.0; 64];
        burst.render_block(&mut out, &ctx);
        assert!(out.iter().all(|&s| s == 0.5));
        assert_eq!(burst.remaining(), 36);

        burst.render_block(&mut out, &ctx.at(0.064));
        assert!(out[..36].iter().all(|&s| s == 0.5));
        assert!(out[36..].iter().all(|&s| s == 0.0));
        assert_eq!(burst.remaining(), 0);

        burst.note_on(0.2);
        assert_eq!(burst.remaining(), 100);
    }

    #[test]
    fn bursts_share_one_buffer() {
        let buffer: Arc<[f32]> = Arc::from(vec![0.1f32; 10]);
        let a = NoiseBurst::new(buffer.clone());
        let b = NoiseBurst::new(buffer.clone());
        assert_eq!(Arc::strong_count(&buffer), 3);
        drop((a, b));
        assert_eq!(Arc::strong_count(&buffer), 1);
    }
}
