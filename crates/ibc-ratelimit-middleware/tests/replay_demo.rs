#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(clippy::panic)]

use ibc_ratelimit_middleware::config;
use ibc_ratelimit_middleware::obs::events::EVENT_ACK_ERROR;
use ibc_ratelimit_middleware::replay::{parse_trace, Replayer, StepOutcome};

const CONFIG: &str = include_str!("../../../demos/ratelimit.yaml");
const TRACE: &str = include_str!("../../../demos/trace.jsonl");

#[test]
fn demo_trace_replays() {
    let cfg = config::load_from_str(CONFIG).expect("demo config parses");
    let replayer = Replayer::from_config(&cfg).unwrap();
    let steps = parse_trace(TRACE).unwrap();
    assert_eq!(steps.len(), 10);

    let out = replayer.run(&steps);
    assert_eq!(out[0], StepOutcome::Sent { sequence: 1 });
    assert_eq!(out[1], StepOutcome::Sent { sequence: 2 });
    assert!(matches!(&out[2], StepOutcome::SendRejected { .. }));
    assert_eq!(out[3], StepOutcome::Acknowledged);
    assert_eq!(out[4], StepOutcome::Sent { sequence: 3 });
    assert_eq!(out[5], StepOutcome::TimedOut);
    assert_eq!(out[6], StepOutcome::Acknowledged);
    assert!(matches!(&out[7], StepOutcome::Received { ack } if ack.is_success()));
    assert!(matches!(&out[8], StepOutcome::Received { ack } if !ack.is_success()));
    assert_eq!(out[9], StepOutcome::Sent { sequence: 4 });

    assert_eq!(replayer.events().of_kind(EVENT_ACK_ERROR).len(), 1);

    let metrics = replayer.metrics().render();
    assert_eq!(metrics, replayer.middleware().metrics().render());
    assert!(metrics.contains("ibcratelimit_admissions_total{"), "{metrics}");
    assert!(metrics.contains("ibcratelimit_reverts_total{"), "{metrics}");
}
