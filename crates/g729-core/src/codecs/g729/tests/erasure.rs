use super::super::{G729Config, G729Decoder, G729Encoder, L_FRAME};
use super::{energy, voiced};

fn primed_decoder() -> (G729Decoder, Vec<[u8; 10]>) {
    let config = G729Config::default().with_vad(false);
    let mut encoder = G729Encoder::new(config.clone());
    let mut decoder = G729Decoder::new(config);
    let mut frames = Vec::new();
    for pcm in voiced(140.0, 30, 21).chunks_exact(L_FRAME) {
        let frame = encoder.encode_frame(pcm).unwrap();
        let bytes: [u8; 10] = frame.as_bytes().try_into().unwrap();
        decoder.decode_payload(&bytes).unwrap();
        frames.push(bytes);
    }
    (decoder, frames)
}

#[test]
fn test_gains_decay_over_consecutive_erasures() {
    let (mut decoder, _) = primed_decoder();
    let (mut last_pitch, mut last_code) = decoder.last_gains();
    assert!(last_code > 0);

    for n in 0..12 {
        decoder.conceal();
        let (gain_pitch, gain_code) = decoder.last_gains();
        assert!(gain_pitch <= last_pitch, "erasure {n}: pitch gain {gain_pitch} > {last_pitch}");
        assert!(gain_code <= last_code, "erasure {n}: code gain {gain_code} > {last_code}");
        assert!(gain_pitch <= 29491);
        last_pitch = gain_pitch;
        last_code = gain_code;
    }
}

#[test]
fn test_concealed_output_fades() {
    let (mut decoder, _) = primed_decoder();
    let first = energy(&decoder.conceal());
    let mut last = first;
    for _ in 0..20 {
        last = energy(&decoder.conceal());
    }
    assert!(last < first, "energy {last} after erasures, {first} at the start");
}

#[test]
fn test_good_frame_resynchronizes() {
    let (mut reference, frames) = primed_decoder();
    let (mut lossy, _) = primed_decoder();

    // lose a few frames on one side, then feed both the same stream
    for _ in 0..3 {
        lossy.conceal();
        reference.decode_payload(&frames[0]).unwrap();
    }
    let mut diff_start = 0.0;
    let mut diff_end = 0.0;
    for (n, frame) in frames.iter().cycle().skip(1).take(40).enumerate() {
        let a = reference.decode_payload(frame).unwrap();
        let b = lossy.decode_payload(frame).unwrap();
        let d: f64 = a
            .iter()
            .zip(b.iter())
            .map(|(&x, &y)| (f64::from(x) - f64::from(y)).powi(2))
            .sum();
        if n < 5 {
            diff_start += d;
        } else if n >= 35 {
            diff_end += d;
        }
    }
    assert!(diff_end <= diff_start, "{diff_end} > {diff_start}");
}
