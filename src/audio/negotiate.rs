//! Format negotiation
//!
//! Maps a desired sample format, sample rate and channel layout onto the
//! closest values a codec declares support for. An exact match always
//! wins; otherwise the smallest supported value at or above the target is
//! preferred, falling back to the largest value below it.

use serde::{Deserialize, Serialize};

use super::format::{AudioFormat, ChannelLayout, SampleFormat};

/// Constraint lists a codec declares. `None` means unconstrained.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CodecCapabilities {
    pub sample_formats: Option<Vec<SampleFormat>>,
    pub sample_rates: Option<Vec<u32>>,
    pub channel_layouts: Option<Vec<ChannelLayout>>,
}

/// Walk `supported` and pick the closest value by `size`.
///
/// Ties keep the earlier entry.
fn closest_by_size<T, F>(supported: &[T], target: T, size: F) -> T
where
    T: Copy + PartialEq,
    F: Fn(T) -> i64,
{
    let Some(&first) = supported.first() else {
        return target;
    };

    let target_size = size(target);
    let mut best = first;
    let mut best_size = size(best);

    for &candidate in supported {
        if candidate == target {
            return target;
        }

        let candidate_size = size(candidate);
        let grows_toward_target = best_size < target_size && candidate_size > best_size;
        let closer_from_above = candidate_size >= target_size
            && (target_size - candidate_size).abs() < (target_size - best_size).abs();

        if grows_toward_target || closer_from_above {
            best = candidate;
            best_size = candidate_size;
        }
    }

    best
}

pub fn closest_sample_format(supported: Option<&[SampleFormat]>, target: SampleFormat) -> SampleFormat {
    let supported = match supported {
        Some(list) if !list.is_empty() => list,
        _ => return target,
    };

    let best = closest_by_size(supported, target, |f| f.bytes_per_sample() as i64);

    // prefer interleaved
    let packed = best.packed();
    if supported.contains(&packed) {
        packed
    } else {
        best
    }
}

pub fn closest_sample_rate(supported: Option<&[u32]>, target: u32) -> u32 {
    match supported {
        Some(list) => closest_by_size(list, target, i64::from),
        None => target,
    }
}

pub fn closest_channel_layout(supported: Option<&[ChannelLayout]>, target: ChannelLayout) -> ChannelLayout {
    match supported {
        Some(list) => closest_by_size(list, target, |l| l.channel_count() as i64),
        None => target,
    }
}

/// Resolve every dimension of `target` against `caps`
pub fn negotiate(caps: &CodecCapabilities, target: &AudioFormat) -> AudioFormat {
    AudioFormat {
        sample_rate: closest_sample_rate(caps.sample_rates.as_deref(), target.sample_rate),
        sample_format: closest_sample_format(caps.sample_formats.as_deref(), target.sample_format),
        channel_layout: closest_channel_layout(caps.channel_layouts.as_deref(), target.channel_layout),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_exact_match_wins() {
        let rates = [8000, 48000, 44100];
        assert_eq!(closest_sample_rate(Some(&rates), 44100), 44100);

        let formats = [SampleFormat::Flt, SampleFormat::S16];
        assert_eq!(closest_sample_format(Some(&formats), SampleFormat::S16), SampleFormat::S16);
    }

    #[test]
    fn test_smallest_above_target() {
        let rates = [96000, 8000, 48000, 22050];
        assert_eq!(closest_sample_rate(Some(&rates), 44100), 48000);
        assert_eq!(closest_sample_rate(Some(&rates), 11025), 22050);
    }

    #[test]
    fn test_largest_below_when_nothing_above() {
        let rates = [8000, 22050, 16000];
        assert_eq!(closest_sample_rate(Some(&rates), 44100), 22050);

        let layouts = [ChannelLayout::STEREO, ChannelLayout::MONO];
        assert_eq!(
            closest_channel_layout(Some(&layouts), ChannelLayout::LAYOUT_5_1),
            ChannelLayout::STEREO
        );
        let layouts = [ChannelLayout::MONO, ChannelLayout::STEREO];
        assert_eq!(
            closest_channel_layout(Some(&layouts), ChannelLayout::LAYOUT_5_1),
            ChannelLayout::STEREO
        );
    }

    #[test]
    fn test_first_of_equal_sizes_wins() {
        // s32 and flt are both 4 bytes
        let formats = [SampleFormat::S16, SampleFormat::S32, SampleFormat::Flt];
        assert_eq!(closest_sample_format(Some(&formats), SampleFormat::Dbl), SampleFormat::S32);
        assert_eq!(closest_sample_format(Some(&formats), SampleFormat::U8), SampleFormat::S16);
    }

    #[test]
    fn test_prefers_packed_variant() {
        let formats = [SampleFormat::FltP, SampleFormat::Flt];
        assert_eq!(closest_sample_format(Some(&formats), SampleFormat::S32), SampleFormat::Flt);

        let planar_only = [SampleFormat::FltP];
        assert_eq!(closest_sample_format(Some(&planar_only), SampleFormat::S16), SampleFormat::FltP);
    }

    #[test]
    fn test_unconstrained_passes_through() {
        assert_eq!(closest_sample_rate(None, 12345), 12345);
        assert_eq!(closest_sample_rate(Some(&[]), 12345), 12345);
        assert_eq!(closest_sample_format(None, SampleFormat::DblP), SampleFormat::DblP);
        assert_eq!(closest_sample_format(Some(&[]), SampleFormat::U8), SampleFormat::U8);
        assert_eq!(
            closest_channel_layout(None, ChannelLayout::LAYOUT_7_1),
            ChannelLayout::LAYOUT_7_1
        );
    }

    #[test]
    fn test_negotiate_surround_float_target() {
        let caps = CodecCapabilities {
            sample_formats: Some(vec![SampleFormat::S16, SampleFormat::S32]),
            sample_rates: Some(vec![44100, 48000]),
            channel_layouts: Some(vec![ChannelLayout::STEREO, ChannelLayout::MONO]),
        };
        let target = AudioFormat::new(48000, SampleFormat::Flt, ChannelLayout::LAYOUT_5_1);

        let actual = negotiate(&caps, &target);
        assert_eq!(actual, AudioFormat::new(48000, SampleFormat::S32, ChannelLayout::STEREO));
    }

    proptest! {
        #[test]
        fn prop_rate_contained_is_identity(mut rates in prop::collection::vec(1u32..200_000, 1..8), pick in any::<prop::sample::Index>()) {
            let target = rates[pick.index(rates.len())];
            rates.sort_unstable();
            prop_assert_eq!(closest_sample_rate(Some(&rates), target), target);
        }

        #[test]
        fn prop_rate_prefers_smallest_at_or_above(rates in prop::collection::vec(1u32..200_000, 1..8), target in 1u32..200_000) {
            let chosen = closest_sample_rate(Some(&rates), target);
            prop_assert!(rates.contains(&chosen));

            match rates.iter().copied().filter(|&r| r >= target).min() {
                Some(above) => prop_assert_eq!(chosen, above),
                None => prop_assert_eq!(chosen, rates.iter().copied().max().unwrap()),
            }
        }
    }
}
