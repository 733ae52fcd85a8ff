use application::{EventNormalizerService, NormalizerStats};
use config::{InputConfig, OutputConfig};
use serde_json::{json, Value};
use tokio::io::BufReader;

fn parse_output(output: &[u8]) -> Vec<Value> {
    String::from_utf8(output.to_vec())
        .unwrap()
        .lines()
        .map(|line| serde_json::from_str(line).unwrap())
        .collect()
}

#[tokio::test]
async fn test_pipeline_normalizes_each_line_in_order() {
    let input = concat!(
        "{\"event\":\"ping\",\"channel\":\"c1\"}\n",
        "{\"event\":\"msg\",\"data\":\"{\\\"x\\\":1}\"}\n",
        "\n",
        "{\"event\":\"msg\",\"data\":\"not-json\"}\n",
        "not json at all\n",
    );
    let service = EventNormalizerService::default();
    let mut output = Vec::new();

    let stats = service
        .run(BufReader::new(input.as_bytes()), &mut output)
        .await
        .unwrap();

    assert_eq!(
        parse_output(&output),
        vec![
            json!({"event": "ping", "channel": "c1"}),
            json!({"event": "msg", "data": {"x": 1}}),
            json!({"event": "msg", "data": "not-json"}),
            json!({"event": "not json at all"}),
        ]
    );
    assert_eq!(
        stats,
        NormalizerStats {
            explicit: 0,
            envelope: 3,
            payload_decoded: 1,
            payload_unparsed: 1,
            raw_fallback: 1,
            skipped: 1,
        }
    );
    assert_eq!(service.stats(), stats);
}

#[tokio::test]
async fn test_pipeline_skips_oversized_lines() {
    let service = EventNormalizerService::with_config(
        InputConfig {
            max_message_bytes: 16,
            skip_blank_lines: true,
        },
        OutputConfig::default(),
    );
    let input = "short\nthis line is far too long to pass\nok\n";
    let mut output = Vec::new();

    let stats = service.run(input.as_bytes(), &mut output).await.unwrap();

    assert_eq!(
        parse_output(&output),
        vec![json!({"event": "short"}), json!({"event": "ok"})]
    );
    assert_eq!(stats.skipped, 1);
    assert_eq!(stats.raw_fallback, 2);
}

#[tokio::test]
async fn test_pipeline_handles_missing_trailing_newline() {
    let service = EventNormalizerService::default();
    let mut output = Vec::new();

    service
        .run("{\"event\":\"last\"}".as_bytes(), &mut output)
        .await
        .unwrap();

    assert_eq!(parse_output(&output), vec![json!({"event": "last"})]);
}

#[tokio::test]
async fn test_pipeline_continues_after_invalid_utf8() {
    let service = EventNormalizerService::default();
    let input: &[u8] = b"first\n\xff\xfe\nsecond\nthird\n";
    let mut output = Vec::new();

    let stats = service.run(input, &mut output).await.unwrap();

    assert_eq!(
        parse_output(&output),
        vec![
            json!({"event": "first"}),
            json!({"event": "second"}),
            json!({"event": "third"}),
        ]
    );
    assert_eq!(stats.skipped, 1);
    assert_eq!(stats.raw_fallback, 3);
}

#[tokio::test]
async fn test_pipeline_bounds_oversized_line_before_valid_one() {
    let service = EventNormalizerService::with_config(
        InputConfig {
            max_message_bytes: 32,
            skip_blank_lines: true,
        },
        OutputConfig::default(),
    );
    let mut input = vec![b'a'; 10_000];
    input.extend_from_slice(b"\n{\"event\":\"after\",\"channel\":\"c1\"}\n");
    let mut output = Vec::new();

    let stats = service
        .run(BufReader::with_capacity(64, input.as_slice()), &mut output)
        .await
        .unwrap();

    assert_eq!(
        parse_output(&output),
        vec![json!({"event": "after", "channel": "c1"})]
    );
    assert_eq!(stats.skipped, 1);
    assert_eq!(stats.envelope, 1);
}

#[tokio::test]
async fn test_pipeline_accepts_line_at_limit_with_carriage_return() {
    let service = EventNormalizerService::with_config(
        InputConfig {
            max_message_bytes: 4,
            skip_blank_lines: true,
        },
        OutputConfig::default(),
    );
    let mut output = Vec::new();

    let stats = service
        .run("ping\r\npings\r\n".as_bytes(), &mut output)
        .await
        .unwrap();

    assert_eq!(parse_output(&output), vec![json!({"event": "ping"})]);
    assert_eq!(stats.skipped, 1);
}
