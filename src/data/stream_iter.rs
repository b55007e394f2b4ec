// ============================================================
// Layer 4 - Ordered Stream Iterator
// ============================================================
// Language-model style windows over an ordered token stream.
//
// The stream is stored time-major as [stream_len, batch_width]:
//
//   input [batch_width, stream_len]   (one sequence per row)
//        │ transpose
//        ▼
//   data  [stream_len, batch_width]   (one time step per row)
//
// A window starting at step i covers rows
//
//   [max(0, i - ext_len), i + seq_len)
//   seq_len = min(span, stream_len - 1 - i)
//
// ext_len extra rows of look-back context are prepended but do
// not count towards the step advance.
//
// Two ways to walk the stream:
//   fixed   - span = bptt every step
//   varlen  - span drawn from a normal distribution every step
//             (see VarlenConfig), advancing by the realised
//             seq_len. Reproducible for a seeded RNG.

use rand::Rng;
use rand_distr::{Distribution, Normal};

use crate::domain::buffer::{IdBuffer, Location};
use crate::domain::error::{CorpusError, Result};

/// Probability of centring a varlen span on the full bptt
/// rather than on half of it.
const FULL_SPAN_PROB: f64 = 0.95;

/// One window of the stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreamWindow {
    /// `[window_rows, batch_width]`, look-back context included
    pub data: IdBuffer,
    /// Number of new steps covered by this window
    pub seq_len: usize,
    /// Span that was requested for this window
    pub span: usize,
}

/// Parameters of variable-length iteration.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VarlenConfig {
    /// Standard deviation of the sampled span
    pub std: f64,
    /// Lower bound on the sampled span
    pub min_len: usize,
    /// Upper bound is bptt + max_deviation * std
    pub max_deviation: usize,
}

impl Default for VarlenConfig {
    fn default() -> Self {
        Self { std: 5.0, min_len: 5, max_deviation: 3 }
    }
}

impl VarlenConfig {
    /// Largest span that can be drawn for a given bptt. Saturates
    /// at `usize::MAX` for very large deviations.
    pub fn max_len(&self, bptt: usize) -> usize {
        bptt.saturating_add((self.max_deviation as f64 * self.std) as usize)
    }
}

#[derive(Debug, Clone)]
pub struct OrderedStreamIterator {
    data: IdBuffer,
    bptt: usize,
    ext_len: usize,
    n_step: usize,
    n_batch: usize,
}

impl OrderedStreamIterator {
    /// Build from `[batch_width, stream_len]` sequences, or from a
    /// flat stream of exactly `batch_width * stream_len` ids.
    pub fn new(
        stream: IdBuffer,
        batch_width: usize,
        bptt: usize,
        stream_len: usize,
        ext_len: Option<usize>,
        location: Location,
    ) -> Result<Self> {
        if bptt == 0 {
            return Err(CorpusError::config("bptt must be at least 1"));
        }
        if batch_width == 0 {
            return Err(CorpusError::config("batch width must be at least 1"));
        }

        let sequences = match stream.rank() {
            1 => stream.reshape(batch_width, stream_len)?,
            2 => stream,
            rank => return Err(CorpusError::shape("stream rank", "1 or 2", rank)),
        };
        let data = sequences.transpose()?.to(location);

        if data.rows() != stream_len {
            return Err(CorpusError::shape("stream length", stream_len, data.rows()));
        }
        if data.row_len() != batch_width {
            return Err(CorpusError::shape("stream batch width", batch_width, data.row_len()));
        }

        let n_batch = stream_len.div_ceil(bptt);
        tracing::debug!(
            "Ordered stream iterator: data {:?}, bptt={}, ext_len={:?}",
            data.dims(),
            bptt,
            ext_len,
        );

        Ok(Self {
            data,
            bptt,
            ext_len: ext_len.unwrap_or(0),
            n_step: stream_len,
            n_batch,
        })
    }

    pub fn stream_len(&self) -> usize {
        self.n_step
    }

    pub fn batch_width(&self) -> usize {
        self.data.row_len()
    }

    pub fn bptt(&self) -> usize {
        self.bptt
    }

    pub fn ext_len(&self) -> usize {
        self.ext_len
    }

    /// `ceil(stream_len / bptt)`
    pub fn n_batch(&self) -> usize {
        self.n_batch
    }

    /// Window starting at step `i`; `bptt` overrides the span.
    pub fn get_batch(&self, i: usize, bptt: Option<usize>) -> StreamWindow {
        let span = bptt.unwrap_or(self.bptt);
        let seq_len = span.min(self.n_step.saturating_sub(1).saturating_sub(i));
        let end = i + seq_len;
        let begin = i.saturating_sub(self.ext_len);

        StreamWindow {
            data: self.data.narrow(begin, end.saturating_sub(begin)),
            seq_len,
            span,
        }
    }

    /// Windows of `bptt` steps from `start`.
    pub fn iter_fixed(&self, start: usize) -> FixedWindows<'_> {
        FixedWindows { source: self, next: start }
    }

    /// Windows of randomly drawn span from `start`.
    pub fn iter_varlen<R: Rng>(
        &self,
        start: usize,
        config: VarlenConfig,
        rng: R,
    ) -> Result<VarlenWindows<'_, R>> {
        if !config.std.is_finite() || config.std < 0.0 {
            return Err(CorpusError::config(format!(
                "varlen std must be finite and non-negative, got {}",
                config.std
            )));
        }

        Ok(VarlenWindows {
            source: self,
            config,
            max_len: config.max_len(self.bptt),
            rng,
            next: start,
            done: false,
        })
    }
}

impl<'a> IntoIterator for &'a OrderedStreamIterator {
    type Item = StreamWindow;
    type IntoIter = FixedWindows<'a>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter_fixed(0)
    }
}

pub struct FixedWindows<'a> {
    source: &'a OrderedStreamIterator,
    next: usize,
}

impl Iterator for FixedWindows<'_> {
    type Item = StreamWindow;

    fn next(&mut self) -> Option<StreamWindow> {
        if self.next >= self.source.n_step.saturating_sub(1) {
            return None;
        }
        let window = self.source.get_batch(self.next, None);
        self.next = self.next.saturating_add(self.source.bptt);
        Some(window)
    }
}

pub struct VarlenWindows<'a, R> {
    source: &'a OrderedStreamIterator,
    config: VarlenConfig,
    max_len: usize,
    rng: R,
    next: usize,
    done: bool,
}

impl<R: Rng> VarlenWindows<'_, R> {
    fn draw_span(&mut self) -> usize {
        let bptt = self.source.bptt as f64;
        let centre = if self.rng.gen::<f64>() < FULL_SPAN_PROB { bptt } else { bptt / 2.0 };

        // std is validated in iter_varlen
        let drawn = match Normal::new(centre, self.config.std) {
            Ok(normal) => normal.sample(&mut self.rng),
            Err(_) => centre,
        };

        // Truncate toward zero, then clamp into [min_len, max_len].
        // A zero span would never advance the cursor.
        let drawn = drawn.trunc().max(0.0) as usize;
        drawn.max(self.config.min_len).min(self.max_len).max(1)
    }
}

impl<R: Rng> Iterator for VarlenWindows<'_, R> {
    type Item = StreamWindow;

    fn next(&mut self) -> Option<StreamWindow> {
        if self.done {
            return None;
        }

        let span = self.draw_span();
        let window = self.source.get_batch(self.next, Some(span));
        self.next = self.next.saturating_add(window.seq_len);

        if self.next >= self.source.n_step.saturating_sub(2) {
            self.done = true;
        }
        Some(window)
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use rand::{rngs::StdRng, SeedableRng};

    /// `width` sequences of length `len`; sequence b holds
    /// b * 1000 + t at step t.
    fn sequences(width: usize, len: usize) -> IdBuffer {
        let data = (0..width)
            .flat_map(|b| (0..len).map(move |t| (b * 1000 + t) as i32))
            .collect();
        IdBuffer::matrix(data, width, len).unwrap()
    }

    fn stream(width: usize, len: usize, bptt: usize, ext: Option<usize>) -> OrderedStreamIterator {
        OrderedStreamIterator::new(sequences(width, len), width, bptt, len, ext, Location::Host)
            .unwrap()
    }

    #[test]
    fn test_data_is_time_major() {
        let it = stream(3, 10, 4, None);
        let w = it.get_batch(0, None);
        assert_eq!(w.data.dims(), &[4, 3]);
        assert_eq!(w.data.row(1), Some(&[1, 1001, 2001][..]));
    }

    #[test]
    fn test_flat_stream_is_reshaped() {
        let flat = IdBuffer::vector(sequences(2, 6).into_vec());
        let it = OrderedStreamIterator::new(flat, 2, 3, 6, None, Location::Host).unwrap();
        assert_eq!(it.stream_len(), 6);
        assert_eq!(it.batch_width(), 2);
        assert_eq!(it.get_batch(0, None).data.row(2), Some(&[2, 1002][..]));
    }

    #[test]
    fn test_rejects_wrong_stream_length() {
        let err =
            OrderedStreamIterator::new(sequences(2, 8), 2, 3, 10, None, Location::Host).unwrap_err();
        assert!(matches!(err, CorpusError::Shape { .. }));
    }

    #[test]
    fn test_rejects_wrong_batch_width() {
        let err =
            OrderedStreamIterator::new(sequences(2, 8), 3, 3, 8, None, Location::Host).unwrap_err();
        assert!(matches!(err, CorpusError::Shape { .. }));
    }

    #[test]
    fn test_rejects_flat_stream_of_wrong_size() {
        let flat = IdBuffer::vector(vec![0; 11]);
        assert!(OrderedStreamIterator::new(flat, 2, 3, 6, None, Location::Host).is_err());
    }

    #[test]
    fn test_fixed_iteration_windows() {
        // stream_len 10, bptt 4: starts 0, 4, 8 with seq_len 4, 4, 1
        let it = stream(2, 10, 4, None);
        let lens: Vec<usize> = it.iter_fixed(0).map(|w| w.seq_len).collect();
        assert_eq!(lens, vec![4, 4, 1]);
        assert_eq!(it.n_batch(), 3);
    }

    #[test]
    fn test_ext_len_prepends_context() {
        let it = stream(1, 10, 3, Some(2));
        let first = it.get_batch(0, None);
        assert_eq!(first.data.rows(), 3);

        let w = it.get_batch(3, None);
        assert_eq!(w.seq_len, 3);
        assert_eq!(w.data.as_slice(), &[1, 2, 3, 4, 5]);
    }

    #[test]
    fn test_window_at_end_is_empty() {
        let it = stream(2, 10, 4, None);
        let w = it.get_batch(9, None);
        assert_eq!(w.seq_len, 0);
        assert!(w.data.is_empty());
    }

    #[test]
    fn test_varlen_spans_stay_in_bounds() {
        let it = stream(2, 400, 20, None);
        let config = VarlenConfig::default();
        let max_len = config.max_len(20);
        assert_eq!(max_len, 35);

        let rng = StdRng::seed_from_u64(17);
        let windows: Vec<StreamWindow> = it.iter_varlen(0, config, rng).unwrap().collect();
        assert!(!windows.is_empty());
        for w in &windows {
            assert!(w.span >= config.min_len && w.span <= max_len, "span {}", w.span);
            assert!(w.seq_len <= w.span);
        }
    }

    #[test]
    fn test_varlen_covers_stream() {
        let it = stream(2, 400, 20, None);
        let rng = StdRng::seed_from_u64(3);
        let covered: usize = it
            .iter_varlen(0, VarlenConfig::default(), rng)
            .unwrap()
            .map(|w| w.seq_len)
            .sum();
        // iteration stops once within 2 steps of the end
        assert!((398..=399).contains(&covered), "covered {covered}");
    }

    #[test]
    fn test_varlen_is_deterministic_for_seed() {
        let it = stream(2, 300, 16, None);
        let spans = |seed: u64| -> Vec<usize> {
            it.iter_varlen(0, VarlenConfig::default(), StdRng::seed_from_u64(seed))
                .unwrap()
                .map(|w| w.span)
                .collect()
        };
        assert_eq!(spans(42), spans(42));
    }

    #[test]
    fn test_varlen_zero_std_uses_centre() {
        let it = stream(1, 100, 10, None);
        let config = VarlenConfig { std: 0.0, min_len: 1, max_deviation: 3 };
        for w in it.iter_varlen(0, config, StdRng::seed_from_u64(1)).unwrap() {
            assert!(w.span == 10 || w.span == 5, "span {}", w.span);
        }
    }

    #[test]
    fn test_varlen_half_span_is_rare() {
        // One column, 20000 steps: roughly 2000 windows
        let it = stream(1, 20_000, 10, None);
        let config = VarlenConfig { std: 0.0, min_len: 1, max_deviation: 3 };
        let spans: Vec<usize> = it
            .iter_varlen(0, config, StdRng::seed_from_u64(11))
            .unwrap()
            .map(|w| w.span)
            .collect();

        let half = spans.iter().filter(|&&s| s == 5).count();
        let frac = half as f64 / spans.len() as f64;
        assert!(spans.len() > 1900, "windows {}", spans.len());
        assert!((0.03..=0.07).contains(&frac), "half-span fraction {frac}");
    }

    #[test]
    fn test_varlen_huge_std_saturates_max_len() {
        let config = VarlenConfig { std: 1e20, min_len: 5, max_deviation: 3 };
        assert_eq!(config.max_len(10), usize::MAX);

        let it = stream(1, 40, 10, None);
        let windows: Vec<StreamWindow> =
            it.iter_varlen(0, config, StdRng::seed_from_u64(5)).unwrap().collect();
        assert!(windows.iter().all(|w| w.span >= config.min_len));
        let covered: usize = windows.iter().map(|w| w.seq_len).sum();
        assert!((38..=39).contains(&covered), "covered {covered}");
    }

    #[test]
    fn test_fixed_iteration_with_huge_bptt() {
        let it = stream(1, 10, usize::MAX, None);
        let lens: Vec<usize> = it.iter_fixed(1).map(|w| w.seq_len).collect();
        assert_eq!(lens, vec![8]);
    }

    #[test]
    fn test_varlen_rejects_negative_std() {
        let it = stream(1, 20, 4, None);
        let config = VarlenConfig { std: -1.0, ..VarlenConfig::default() };
        let err = it.iter_varlen(0, config, StdRng::seed_from_u64(0)).err().unwrap();
        assert!(err.is_config());
    }

    #[test]
    fn test_varlen_yields_at_least_once() {
        let it = stream(1, 2, 4, None);
        let n = it
            .iter_varlen(0, VarlenConfig::default(), StdRng::seed_from_u64(0))
            .unwrap()
            .count();
        assert_eq!(n, 1);
    }
}
