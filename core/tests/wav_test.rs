use intone_core::audio::wav::{decode, encode, AudioFormat, RawAudioBuffer, WAV_HEADER_LEN};
use intone_core::IntoneError;
use std::io::Cursor;

fn pattern(len: usize) -> Vec<u8> {
    (0..len).map(|i| (i * 31 % 251) as u8).collect()
}

#[test]
fn round_trips_across_formats() {
    let formats = [
        AudioFormat::mono_pcm16(24_000),
        AudioFormat::new(2, 44_100, 16),
        AudioFormat::new(1, 8_000, 8),
        AudioFormat::new(6, 48_000, 24),
        AudioFormat::new(2, 96_000, 32),
    ];
    for fmt in formats {
        for frames in [0usize, 1, 7, 1_000] {
            let samples = pattern(frames * fmt.frame_size());
            let wav = encode(&fmt, &samples).unwrap();
            assert_eq!(wav.len(), WAV_HEADER_LEN + samples.len());
            assert_eq!(decode(&wav).unwrap(), (fmt, samples), "{fmt} x {frames}");
        }
    }
}

#[test]
fn encoded_pcm16_is_readable_by_hound() {
    let fmt = AudioFormat::mono_pcm16(24_000);
    let samples: Vec<i16> = vec![0, 1, -1, i16::MAX, i16::MIN, 1234];
    let bytes: Vec<u8> = samples.iter().flat_map(|s| s.to_le_bytes()).collect();

    let wav = encode(&fmt, &bytes).unwrap();
    let mut reader = hound::WavReader::new(Cursor::new(wav)).unwrap();
    let spec = reader.spec();
    assert_eq!(spec.channels, 1);
    assert_eq!(spec.sample_rate, 24_000);
    assert_eq!(spec.bits_per_sample, 16);
    assert_eq!(spec.sample_format, hound::SampleFormat::Int);

    let read: Vec<i16> = reader.samples::<i16>().map(|s| s.unwrap()).collect();
    assert_eq!(read, samples);
}

#[test]
fn decodes_hound_written_files() {
    let spec = hound::WavSpec {
        channels: 2,
        sample_rate: 16_000,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };
    let mut cursor = Cursor::new(Vec::new());
    {
        let mut writer = hound::WavWriter::new(&mut cursor, spec).unwrap();
        for s in [100i16, -100, 200, -200] {
            writer.write_sample(s).unwrap();
        }
        writer.finalize().unwrap();
    }

    let (fmt, samples) = decode(cursor.get_ref()).unwrap();
    assert_eq!(fmt, AudioFormat::new(2, 16_000, 16));
    let expected: Vec<u8> = [100i16, -100, 200, -200]
        .iter()
        .flat_map(|s| s.to_le_bytes())
        .collect();
    assert_eq!(samples, expected);
}

#[test]
fn missing_markers_are_malformed() {
    let good = encode(&AudioFormat::mono_pcm16(24_000), &[0; 4]).unwrap();

    let mut no_riff = good.clone();
    no_riff[0..4].copy_from_slice(b"RIFX");
    let mut no_wave = good.clone();
    no_wave[8..12].copy_from_slice(b"AVI ");
    let mut no_data = good.clone();
    no_data[36..40].copy_from_slice(b"junk");

    for (name, bytes) in [
        ("riff", no_riff),
        ("wave", no_wave),
        ("data", no_data),
        ("short", good[..10].to_vec()),
        ("empty", Vec::new()),
    ] {
        let err = decode(&bytes).unwrap_err();
        assert!(
            matches!(err, IntoneError::MalformedContainer(_)),
            "{name}: {err:?}"
        );
    }
}

#[test]
fn overlong_data_length_is_rejected() {
    let mut wav = encode(&AudioFormat::mono_pcm16(24_000), &[0; 8]).unwrap();
    wav[40..44].copy_from_slice(&10u32.to_le_bytes());
    assert!(matches!(
        decode(&wav),
        Err(IntoneError::MalformedContainer(_))
    ));
}

#[test]
fn trailing_bytes_after_data_are_ignored() {
    let fmt = AudioFormat::mono_pcm16(24_000);
    let mut wav = encode(&fmt, &[1, 2, 3, 4]).unwrap();
    wav.extend_from_slice(b"tail");
    assert_eq!(decode(&wav).unwrap(), (fmt, vec![1, 2, 3, 4]));
}

#[test]
fn non_pcm_format_code_is_rejected() {
    let mut wav = encode(&AudioFormat::new(1, 24_000, 32), &[0; 4]).unwrap();
    wav[20..22].copy_from_slice(&3u16.to_le_bytes());
    assert!(matches!(
        decode(&wav),
        Err(IntoneError::MalformedContainer(_))
    ));
}

#[test]
fn encode_rejects_partial_frames_and_bad_formats() {
    assert!(encode(&AudioFormat::mono_pcm16(24_000), &[0; 3]).is_err());
    assert!(encode(&AudioFormat::new(0, 24_000, 16), &[]).is_err());
    assert!(encode(&AudioFormat::new(1, 0, 16), &[]).is_err());
    assert!(encode(&AudioFormat::new(1, 24_000, 0), &[]).is_err());
}

#[test]
fn concat_preserves_order() {
    let fmt = AudioFormat::mono_pcm16(24_000);
    let parts = vec![
        RawAudioBuffer::new(fmt, vec![1, 1]).unwrap(),
        RawAudioBuffer::new(fmt, vec![]).unwrap(),
        RawAudioBuffer::new(fmt, vec![2, 2, 3, 3]).unwrap(),
    ];
    let joined = RawAudioBuffer::concat(parts).unwrap();
    assert_eq!(joined.format(), fmt);
    assert_eq!(joined.samples(), &[1, 1, 2, 2, 3, 3]);
}

#[test]
fn concat_refuses_mixed_formats() {
    let parts = vec![
        RawAudioBuffer::new(AudioFormat::mono_pcm16(24_000), vec![0, 0]).unwrap(),
        RawAudioBuffer::new(AudioFormat::mono_pcm16(16_000), vec![0, 0]).unwrap(),
    ];
    let err = RawAudioBuffer::concat(parts).unwrap_err();
    assert!(matches!(err, IntoneError::FormatMismatch(_)));
}

#[test]
fn concat_of_nothing_is_an_error() {
    assert!(RawAudioBuffer::concat(Vec::new()).is_err());
}
