//! Fixed-length segmentation of a waveform
//!
//! Chunks are contiguous and non-overlapping; only the last may be short.
//! Nothing is padded here, the transform pads each chunk internally.

/// One segment borrowed from the input
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Chunk<'a> {
    /// Position in the chunk sequence
    pub index: usize,
    /// Offset of the first sample in the input
    pub start: usize,
    pub samples: &'a [f32],
}

impl Chunk<'_> {
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Start time in seconds
    pub fn start_seconds(&self, sample_rate: u32) -> f64 {
        self.start as f64 / sample_rate as f64
    }
}

/// Iterator over consecutive chunks
pub struct ChunkIter<'a> {
    audio: &'a [f32],
    chunk_size: usize,
    position: usize,
    index: usize,
}

impl<'a> Iterator for ChunkIter<'a> {
    type Item = Chunk<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.position >= self.audio.len() {
            return None;
        }

        let end = (self.position + self.chunk_size).min(self.audio.len());
        let chunk = Chunk {
            index: self.index,
            start: self.position,
            samples: &self.audio[self.position..end],
        };

        self.position = end;
        self.index += 1;
        Some(chunk)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = chunk_count(self.audio.len() - self.position, self.chunk_size);
        (remaining, Some(remaining))
    }
}

impl ExactSizeIterator for ChunkIter<'_> {}

/// Split `audio` into chunks of at most `chunk_size` samples
///
/// A zero `chunk_size` is treated as one sample per chunk.
pub fn split_chunks(audio: &[f32], chunk_size: usize) -> ChunkIter<'_> {
    ChunkIter {
        audio,
        chunk_size: chunk_size.max(1),
        position: 0,
        index: 0,
    }
}

/// Number of chunks `split_chunks` yields: ⌈len / chunk_size⌉
pub fn chunk_count(len: usize, chunk_size: usize) -> usize {
    len.div_ceil(chunk_size.max(1))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exact_multiple() {
        let audio = vec![0.0f32; 300];
        let chunks: Vec<_> = split_chunks(&audio, 100).collect();
        assert_eq!(chunks.len(), 3);
        assert!(chunks.iter().all(|c| c.len() == 100));
        assert_eq!(chunks[2].start, 200);
        assert_eq!(chunks[2].index, 2);
    }

    #[test]
    fn test_short_tail() {
        let audio: Vec<f32> = (0..250).map(|i| i as f32).collect();
        let chunks: Vec<_> = split_chunks(&audio, 100).collect();
        assert_eq!(chunks.len(), chunk_count(250, 100));
        assert_eq!(chunks[2].len(), 50);
        assert_eq!(chunks[2].samples[0], 200.0);
    }

    #[test]
    fn test_concatenation_restores_input() {
        let audio: Vec<f32> = (0..1001).map(|i| (i as f32).sin()).collect();
        let rebuilt: Vec<f32> = split_chunks(&audio, 97)
            .flat_map(|c| c.samples.iter().copied())
            .collect();
        assert_eq!(rebuilt, audio);
    }

    #[test]
    fn test_shorter_than_one_chunk() {
        let audio = vec![1.0f32; 10];
        let chunks: Vec<_> = split_chunks(&audio, 220_500).collect();
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].len(), 10);
    }

    #[test]
    fn test_empty_input() {
        assert_eq!(split_chunks(&[], 100).count(), 0);
        assert_eq!(chunk_count(0, 100), 0);
    }

    #[test]
    fn test_size_hint() {
        let audio = vec![0.0f32; 450];
        let mut iter = split_chunks(&audio, 100);
        assert_eq!(iter.len(), 5);
        iter.next();
        assert_eq!(iter.len(), 4);
    }

    #[test]
    fn test_start_seconds() {
        let audio = vec![0.0f32; 44_100 * 3];
        let chunk = split_chunks(&audio, 44_100).nth(2).unwrap();
        assert!((chunk.start_seconds(44_100) - 2.0).abs() < 1e-12);
    }
}
