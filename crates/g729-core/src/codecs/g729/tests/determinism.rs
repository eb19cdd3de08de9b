use super::super::{G729Config, G729Decoder, G729Encoder, L_FRAME};
use super::voiced;
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};

#[test]
fn test_cloned_state_gives_identical_output() {
    let config = G729Config::default();
    let mut encoder = G729Encoder::new(config.clone());
    let mut decoder = G729Decoder::new(config);

    let input = voiced(130.0, 40, 9);
    let (head, tail) = input.split_at(20 * L_FRAME);
    for pcm in head.chunks_exact(L_FRAME) {
        let frame = encoder.encode_frame(pcm).unwrap();
        decoder.decode_payload(frame.as_bytes()).unwrap();
    }

    let mut encoder2 = encoder.clone();
    let mut decoder2 = decoder.clone();
    let mut rng = SmallRng::seed_from_u64(1);
    for pcm in tail.chunks_exact(L_FRAME) {
        let a = encoder.encode_frame(pcm).unwrap();
        let b = encoder2.encode_frame(pcm).unwrap();
        assert_eq!(a, b);

        // identical erasure pattern on both sides
        if rng.gen_bool(0.2) {
            assert_eq!(decoder.conceal(), decoder2.conceal());
        } else {
            assert_eq!(
                decoder.decode_payload(a.as_bytes()).unwrap(),
                decoder2.decode_payload(b.as_bytes()).unwrap()
            );
        }
    }
}

#[test]
fn test_independent_channels_do_not_interfere() {
    let config = G729Config::default().with_vad(false);
    let input = voiced(200.0, 10, 4);
    let other = voiced(90.0, 10, 8);

    let mut alone = G729Encoder::new(config.clone());
    let expected: Vec<_> = input
        .chunks_exact(L_FRAME)
        .map(|pcm| alone.encode_frame(pcm).unwrap())
        .collect();

    let mut a = G729Encoder::new(config.clone());
    let mut b = G729Encoder::new(config);
    for (n, (pcm, noise)) in input
        .chunks_exact(L_FRAME)
        .zip(other.chunks_exact(L_FRAME))
        .enumerate()
    {
        b.encode_frame(noise).unwrap();
        assert_eq!(a.encode_frame(pcm).unwrap(), expected[n]);
    }
}

#[test]
fn test_channels_run_on_separate_threads() {
    let input = voiced(170.0, 8, 2);
    let reference: Vec<_> = {
        let mut enc = G729Encoder::new(G729Config::default());
        input
            .chunks_exact(L_FRAME)
            .map(|pcm| enc.encode_frame(pcm).unwrap())
            .collect()
    };

    let handles: Vec<_> = (0..4)
        .map(|_| {
            let input = input.clone();
            std::thread::spawn(move || {
                let mut enc = G729Encoder::new(G729Config::default());
                input
                    .chunks_exact(L_FRAME)
                    .map(|pcm| enc.encode_frame(pcm).unwrap())
                    .collect::<Vec<_>>()
            })
        })
        .collect();
    for handle in handles {
        assert_eq!(handle.join().unwrap(), reference);
    }
}
