use super::super::rfc3389::ComfortNoise;
use super::super::{
    CnPayloadFormat, DecodeFlags, EncodedFrame, G729Codec, G729Config, G729Decoder, G729Encoder,
    G729Packet, CN_PAYLOAD_TYPE, L_FRAME, PAYLOAD_TYPE,
};
use super::{energy, voiced};
use crate::error::CodecError;
use crate::types::{AudioCodec, AudioCodecExt};
use proptest::prelude::*;

#[test]
fn test_codec_info() {
    let codec = G729Codec::new_default();
    let info = codec.info();
    assert_eq!(info.name, "G729");
    assert_eq!(info.sample_rate, 8000);
    assert_eq!(info.channels, 1);
    assert_eq!(info.bitrate, 8000);
    assert_eq!(info.frame_size, 80);
    assert_eq!(info.payload_type, Some(18));
    assert_eq!(codec.frame_size(), 80);
    assert!(!codec.supports_variable_frame_size());
}

#[test]
fn test_stream_format_is_checked() {
    let config = G729Config::default();
    assert!(G729Codec::with_format(8000, 1, config.clone()).is_ok());
    assert!(matches!(
        G729Codec::with_format(16000, 1, config.clone()),
        Err(CodecError::InvalidSampleRate { rate: 16000, .. })
    ));
    assert!(matches!(
        G729Codec::with_format(8000, 2, config),
        Err(CodecError::InvalidChannelCount { channels: 2, .. })
    ));
}

#[test]
fn test_multi_frame_encode_and_decode() {
    let mut codec = G729Codec::new(G729Config::default().with_vad(false));
    let input = voiced(125.0, 4, 1);

    let encoded = codec.encode(&input).unwrap();
    assert_eq!(encoded.len(), 40);

    let decoded = codec.decode(&encoded).unwrap();
    assert_eq!(decoded.len(), 4 * L_FRAME);

    assert!(codec.encode(&input[..100]).is_err());
    assert_eq!(codec.decode(&[]).unwrap().len(), L_FRAME);
    assert!(codec.decode(&[0; 13]).is_err());
}

#[test]
fn test_speech_frames_with_trailing_sid() {
    let mut codec = G729Codec::new_default();
    let decoded = codec.decode(&[0; 22]).unwrap();
    assert_eq!(decoded.len(), 3 * L_FRAME);
}

#[test]
fn test_buffer_variants() {
    let mut codec = G729Codec::new(G729Config::default().with_dtx(false));
    let input = voiced(180.0, 2, 6);

    let mut small = [0u8; 10];
    assert!(matches!(
        codec.encode_to_buffer(&input, &mut small),
        Err(CodecError::BufferTooSmall { needed: 20, actual: 10 })
    ));

    let mut bytes = [0u8; 20];
    let written = codec.encode_to_buffer(&input, &mut bytes).unwrap();
    assert_eq!(written, 20);

    let mut pcm = [0i16; 160];
    let decoded = codec.decode_to_buffer(&bytes, &mut pcm).unwrap();
    assert_eq!(decoded, 160);

    assert_eq!(codec.max_encoded_size(80), 10);
    assert_eq!(codec.max_encoded_size(240), 30);
    assert_eq!(codec.max_decoded_size(10), 80);
    assert_eq!(codec.max_decoded_size(22), 240);
}

#[test]
fn test_reset_and_reconfigure() {
    let input = voiced(140.0, 3, 2);
    let mut codec = G729Codec::new(G729Config::default().with_vad(false));
    let first = codec.encode(&input).unwrap();
    let decoded = codec.decode(&first).unwrap();
    codec.reset().unwrap();
    assert_eq!(codec.encode(&input).unwrap(), first);
    // every component of the decoder starts over as well
    assert_eq!(codec.decode(&first).unwrap(), decoded);

    codec.set_config(G729Config::default());
    assert_eq!(codec.variant(), "G.729AB");
    let encoder_config = codec.encoder_mut().config().clone();
    assert_eq!(&encoder_config, codec.config());
}

#[test]
fn test_rfc3389_comfort_noise_end_to_end() {
    let config = G729Config::default().with_cn_payload(CnPayloadFormat::Rfc3389);
    let mut encoder = G729Encoder::new(config.clone());
    let mut decoder = G729Decoder::new(config);

    let mut input = voiced(100.0, 30, 13);
    input.extend(std::iter::repeat(0).take(30 * L_FRAME));

    let mut cn_payloads = 0;
    for pcm in input.chunks_exact(L_FRAME) {
        let frame = encoder.encode_frame(pcm).unwrap();
        if let EncodedFrame::CnRfc3389(bytes) = &frame {
            let noise = ComfortNoise::parse(bytes).unwrap();
            assert_eq!(noise.order, 10);
            cn_payloads += 1;
        }
        assert!(!matches!(frame, EncodedFrame::Sid(_)));
        decoder.decode_payload(frame.as_bytes()).unwrap();
    }
    assert!(cn_payloads > 0);
}

#[test]
fn test_comfort_noise_level_maps_to_sid_gain() {
    let mut decoder = G729Decoder::new(G729Config::default());
    decoder
        .decode_frame(Some(&[30, 127, 127]), DecodeFlags::comfort_noise())
        .unwrap();
    let loud = decoder.sid_gain();
    decoder
        .decode_frame(Some(&[80, 127, 127]), DecodeFlags::comfort_noise())
        .unwrap();
    assert!(decoder.sid_gain() < loud);
}

/// 20 voiced frames, 40 silent frames, 20 voiced frames
fn talk_pause_talk() -> Vec<i16> {
    let mut input = voiced(120.0, 20, 3);
    input.extend(std::iter::repeat(0).take(40 * L_FRAME));
    input.extend(voiced(120.0, 20, 4));
    input
}

#[test]
fn test_talk_pause_talk_through_packets() {
    let input = talk_pause_talk();
    let mut codec = G729Codec::new_default();
    let packets = codec.encode_packets(&input).unwrap();

    assert!(packets.len() >= 2, "{packets:?}");
    assert!(packets.iter().all(|p| p.payload_type == PAYLOAD_TYPE));
    // a SID can only close a packet
    assert!(packets.iter().all(|p| matches!(p.payload.len() % 10, 0 | 2)));
    assert!(packets.iter().any(|p| p.payload.len() % 10 == 2));
    assert!(packets
        .windows(2)
        .all(|w| w[0].frame + w[0].frames() as u64 <= w[1].frame));

    let sent: usize = packets.iter().map(G729Packet::frames).sum();
    assert!(sent < 80, "{sent} frames sent");
    let last = packets.last().unwrap();
    assert_eq!(last.frame + last.frames() as u64, 80);

    let decoded = codec.decode_packets(&packets).unwrap();
    assert_eq!(decoded.len(), input.len());
    let pause = energy(&decoded[45 * L_FRAME..55 * L_FRAME]);
    let resumed = energy(&decoded[70 * L_FRAME..]);
    assert!(resumed > 10.0 * pause.max(1.0), "{resumed} after a pause at {pause}");
}

#[test]
fn test_encode_refuses_buffer_across_dtx_transition() {
    let input = talk_pause_talk();
    let mut codec = G729Codec::new_default();
    let mut fresh = codec.clone();

    let err = codec.encode(&input).unwrap_err();
    assert!(
        matches!(err, CodecError::DtxBoundary { frame } if frame > 0 && frame < 80),
        "{err:?}"
    );

    // the refused buffer leaves the encoder where it was
    assert_eq!(
        codec.encode_packets(&input).unwrap(),
        fresh.encode_packets(&input).unwrap()
    );
}

#[test]
fn test_one_frame_per_call_round_trip() {
    let input = talk_pause_talk();
    let mut codec = G729Codec::new_default();

    let mut sizes = Vec::new();
    let mut decoded = Vec::new();
    for pcm in input.chunks_exact(L_FRAME) {
        let payload = codec.encode(pcm).unwrap();
        sizes.push(payload.len());
        decoded.extend(codec.decode(&payload).unwrap());
    }

    assert_eq!(decoded.len(), input.len());
    assert!(sizes.iter().all(|n| matches!(n, 0 | 2 | 10)), "{sizes:?}");
    assert!(sizes.contains(&0) && sizes.contains(&2), "{sizes:?}");
}

#[test]
fn test_rfc3389_comfort_noise_between_speech_packets() {
    let config = G729Config::default().with_cn_payload(CnPayloadFormat::Rfc3389);
    let input = talk_pause_talk();

    let mut codec = G729Codec::new(config.clone());
    let packets = codec.encode_packets(&input).unwrap();
    let (cn, speech): (Vec<&G729Packet>, Vec<&G729Packet>) =
        packets.iter().partition(|p| p.is_comfort_noise());
    assert!(!cn.is_empty());
    assert!(cn
        .iter()
        .all(|p| p.payload_type == CN_PAYLOAD_TYPE && p.frames() == 1));
    assert!(speech.len() >= 2);
    assert!(speech
        .iter()
        .all(|p| !p.payload.is_empty() && p.payload.len() % 10 == 0));

    let decoded = codec.decode_packets(&packets).unwrap();
    assert_eq!(decoded.len(), input.len());

    // the same stream one payload at a time through the host traits
    let mut host = G729Codec::new(config);
    let mut decoded = Vec::new();
    let mut cn_payloads = 0;
    for pcm in input.chunks_exact(L_FRAME) {
        let payload = host.encode(pcm).unwrap();
        if payload.len() % 10 != 0 {
            cn_payloads += 1;
        }
        decoded.extend(host.decode(&payload).unwrap());
    }
    assert_eq!(decoded.len(), input.len());
    assert_eq!(cn_payloads, cn.len());
}

#[test]
fn test_lost_packets_are_concealed() {
    let mut codec = G729Codec::new(G729Config::default().with_vad(false));
    let input = voiced(150.0, 12, 7);

    let mut packets = Vec::new();
    for pcm in input.chunks_exact(L_FRAME) {
        packets.extend(codec.encode_packets(pcm).unwrap());
    }
    assert_eq!(packets.len(), 12);
    assert_eq!(packets[4].timestamp(), 4 * L_FRAME as u32);

    packets.retain(|p| !(5..8).contains(&p.frame));
    let decoded = codec.decode_packets(&packets).unwrap();
    assert_eq!(decoded.len(), 12 * L_FRAME);

    // a packet older than the decoded frames is rejected
    assert!(codec.decode_packets(&packets[..1]).is_err());
}

proptest! {
    #[test]
    fn any_speech_frame_decodes(frames in proptest::collection::vec(any::<[u8; 10]>(), 1..6)) {
        let mut decoder = G729Decoder::new(G729Config::default());
        for frame in &frames {
            let pcm = decoder.decode_payload(frame).unwrap();
            prop_assert_eq!(pcm.len(), L_FRAME);
        }
        decoder.conceal();
    }

    #[test]
    fn any_payload_is_handled(data in proptest::collection::vec(any::<u8>(), 0..24)) {
        let mut decoder = G729Decoder::new(G729Config::default());
        let result = decoder.decode_payload(&data);
        prop_assert_eq!(result.is_ok(), matches!(data.len(), 0 | 2 | 10));

        let mut codec = G729Codec::new_default();
        let tail = data.len() % 10;
        let valid = tail == 0 || tail == 2;
        prop_assert_eq!(codec.decode(&data).is_ok(), valid);
    }
}
