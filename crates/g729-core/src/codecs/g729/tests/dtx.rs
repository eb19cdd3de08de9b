use super::super::bitstream::unpack_sid;
use super::super::tables_dtx::TAB_SIDGAIN;
use super::super::{EncodedFrame, G729Config, G729Decoder, G729Encoder, L_FRAME};
use super::{energy, voiced};
use crate::types::FrameType;
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};

#[test]
fn test_fifty_silent_frames() {
    let config = G729Config::default();
    let mut encoder = G729Encoder::new(config.clone());
    let mut decoder = G729Decoder::new(config);

    let mut types = Vec::new();
    let mut last_gain_index = None;
    let mut energies = Vec::new();
    for _ in 0..50 {
        let frame = encoder.encode_frame(&[0; L_FRAME]).unwrap();
        if let EncodedFrame::Sid(bytes) = &frame {
            last_gain_index = Some(unpack_sid(bytes).unwrap().gain);
        }
        types.push(frame.frame_type());
        let out = decoder.decode_payload(frame.as_bytes()).unwrap();
        energies.push(energy(&out));
    }

    // stationary silence: one SID, then nothing until the input changes
    let sid_frames: Vec<_> = (0..types.len())
        .filter(|&n| types[n] == FrameType::Sid)
        .collect();
    assert_eq!(sid_frames.len(), 1, "{types:?}");
    let first = sid_frames[0];
    assert!(types[..first].iter().all(|&t| t == FrameType::Speech), "{types:?}");
    assert!(
        types[first + 1..].iter().all(|&t| t == FrameType::Untransmitted),
        "{types:?}"
    );
    assert!(types[first + 1..].len() >= 30, "{types:?}");

    let gain_index = last_gain_index.unwrap_or_default() as usize;
    assert_eq!(decoder.sid_gain(), TAB_SIDGAIN[gain_index]);

    // the smoothed noise level settles around the SID gain
    let tail = &energies[40..];
    let level = (TAB_SIDGAIN[gain_index] as f64).powi(2);
    let mean = tail.iter().sum::<f64>() / tail.len() as f64;
    assert!(mean >= level / 16.0, "mean energy {mean} for SID gain {}", TAB_SIDGAIN[gain_index]);
    assert!(
        tail.iter().all(|&e| e <= 64.0 * level + 16.0),
        "energies {tail:?} for SID gain {}",
        TAB_SIDGAIN[gain_index]
    );
}

#[test]
fn test_sid_frames_are_spaced_during_changing_noise() {
    let config = G729Config::default();
    let mut encoder = G729Encoder::new(config.clone());
    let mut decoder = G729Decoder::new(config);

    // a level step every 8 frames forces new SIDs
    let mut rng = SmallRng::seed_from_u64(5);
    let mut types = Vec::new();
    for n in 0..60 {
        let amplitude: i16 = [0, 40, 5, 120][(n / 8) % 4];
        let pcm: Vec<i16> = (0..L_FRAME)
            .map(|_| if amplitude == 0 { 0 } else { rng.gen_range(-amplitude..=amplitude) })
            .collect();
        let frame = encoder.encode_frame(&pcm).unwrap();
        types.push(frame.frame_type());
        decoder.decode_payload(frame.as_bytes()).unwrap();
    }

    let sid_frames: Vec<_> = (0..types.len())
        .filter(|&n| types[n] == FrameType::Sid)
        .collect();
    assert!(!sid_frames.is_empty());
    // within one pause the SIDs are at least three frames apart
    for w in sid_frames.windows(2) {
        let pause = types[w[0] + 1..w[1]].iter().all(|&t| t == FrameType::Untransmitted);
        assert!(!pause || w[1] - w[0] >= 3, "{types:?}");
    }
}

#[test]
fn test_speech_then_silence_switches_to_comfort_noise() {
    let config = G729Config::default();
    let mut encoder = G729Encoder::new(config.clone());
    let mut decoder = G729Decoder::new(config);

    let mut input = voiced(110.0, 40, 11);
    input.extend(std::iter::repeat(0).take(40 * L_FRAME));

    let mut types = Vec::new();
    for pcm in input.chunks_exact(L_FRAME) {
        let frame = encoder.encode_frame(pcm).unwrap();
        decoder.decode_payload(frame.as_bytes()).unwrap();
        types.push(frame.frame_type());
    }

    assert!(types[5..35].iter().all(|&t| t == FrameType::Speech));
    let silent = &types[60..];
    assert!(silent.iter().all(|&t| t != FrameType::Speech), "{silent:?}");
    assert!(silent.contains(&FrameType::Untransmitted));
}

#[test]
fn test_untransmitted_frames_keep_generating_noise() {
    let mut decoder = G729Decoder::new(G729Config::default());
    let sid = super::super::bitstream::pack_sid(&super::super::bitstream::SidParams {
        l0: 0,
        l1: 3,
        l2: 5,
        gain: 18,
    });
    decoder.decode_payload(&sid).unwrap();
    let mut energies = Vec::new();
    for _ in 0..30 {
        energies.push(energy(&decoder.decode_payload(&[]).unwrap()));
    }
    assert!(energies[10..].iter().all(|&e| e > 1.0), "{energies:?}");
}
