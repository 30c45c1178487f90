//! Event stream ordering and cancellation.

use super::pipeline_flows::{fixture, CLASSIFY_RAG};
use crate::events::{AgentEvent, Node, TraceStatus};
use crate::orchestrator::ANSWER_SLICE_CHARS;
use claims_core::AgentSettings;
use futures::StreamExt;
use std::time::Duration;

#[cfg(test)]
mod tests {
    use super::*;

    fn trace_of(event: &AgentEvent) -> Option<(Node, TraceStatus)> {
        match event {
            AgentEvent::Trace { node, status, .. } => Some((*node, *status)),
            _ => None,
        }
    }

    #[tokio::test]
    async fn test_events_arrive_in_node_order() {
        let f = fixture(AgentSettings::default());
        let answer = "Your individual deductible is $500 per plan year, per page 1.";
        f.llm.push_text(CLASSIFY_RAG);
        f.llm.push_text(answer);

        let events: Vec<AgentEvent> = f
            .orchestrator
            .stream("what is the deductible", Vec::new())
            .collect()
            .await;

        let traces: Vec<_> = events.iter().filter_map(trace_of).collect();
        assert_eq!(
            traces,
            vec![
                (Node::Classify, TraceStatus::Running),
                (Node::Classify, TraceStatus::Complete),
                (Node::SearchDocuments, TraceStatus::Running),
                (Node::SearchDocuments, TraceStatus::Complete),
                (Node::Synthesize, TraceStatus::Running),
                (Node::Synthesize, TraceStatus::Complete),
            ]
        );
        assert!(matches!(
            events[1],
            AgentEvent::Trace { timing_ms: Some(_), .. }
        ));

        let chunks: Vec<&str> = events
            .iter()
            .filter_map(|e| match e {
                AgentEvent::AnswerChunk { text } => Some(text.as_str()),
                _ => None,
            })
            .collect();
        assert!(chunks.iter().all(|c| c.chars().count() <= ANSWER_SLICE_CHARS));
        assert_eq!(chunks[0].chars().count(), ANSWER_SLICE_CHARS);
        assert_eq!(chunks.concat(), answer);

        // Chunks follow the last trace and precede the single complete event
        let first_chunk = events
            .iter()
            .position(|e| matches!(e, AgentEvent::AnswerChunk { .. }))
            .unwrap();
        assert!(events[..first_chunk].iter().all(|e| trace_of(e).is_some()));
        match events.last().unwrap() {
            AgentEvent::Complete { response } => {
                assert_eq!(response.answer, answer);
                assert_eq!(response.agent_trace.len(), 3);
                assert_eq!(response.citations.as_ref().unwrap()[0].page, 1);
            }
            other => panic!("Expected complete event, got {:?}", other),
        }
        let completes = events
            .iter()
            .filter(|e| matches!(e, AgentEvent::Complete { .. }))
            .count();
        assert_eq!(completes, 1);
    }

    #[tokio::test]
    async fn test_degraded_node_reports_error_before_complete() {
        let f = fixture(AgentSettings::default());
        f.llm.push_failure("connection reset");
        f.llm.push_text("Could you rephrase that?");

        let events: Vec<AgentEvent> = f.orchestrator.stream("hmm", Vec::new()).collect().await;

        let traces: Vec<_> = events.iter().filter_map(trace_of).collect();
        assert_eq!(
            &traces[..3],
            &[
                (Node::Classify, TraceStatus::Running),
                (Node::Classify, TraceStatus::Error),
                (Node::Classify, TraceStatus::Complete),
            ]
        );
        match &events[1] {
            AgentEvent::Trace { message, .. } => {
                assert!(message.as_deref().unwrap().contains("connection reset"));
            }
            other => panic!("Expected trace event, got {:?}", other),
        }
        assert_eq!(traces[3], (Node::Synthesize, TraceStatus::Running));
    }

    #[tokio::test]
    async fn test_dropped_stream_stops_the_run() {
        let f = fixture(AgentSettings::default());
        f.llm.push_text(CLASSIFY_RAG);
        f.llm.push_text("unused");

        let stream = f.orchestrator.stream("what is the deductible", Vec::new());
        drop(stream);
        tokio::time::sleep(Duration::from_millis(50)).await;

        assert_eq!(f.llm.call_count(), 0);
        assert_eq!(f.llm.remaining(), 2);
    }

    #[tokio::test]
    async fn test_stream_and_run_agree() {
        let f = fixture(AgentSettings::default());
        for _ in 0..2 {
            f.llm.push_text(CLASSIFY_RAG);
            f.llm.push_text("The deductible is $500.");
        }

        let direct = f.orchestrator.run("what is the deductible", Vec::new()).await;
        let events: Vec<AgentEvent> = f
            .orchestrator
            .stream("what is the deductible", Vec::new())
            .collect()
            .await;
        let streamed = match events.into_iter().last() {
            Some(AgentEvent::Complete { response }) => *response,
            other => panic!("Expected complete event, got {:?}", other),
        };

        assert_eq!(streamed.answer, direct.answer);
        assert_eq!(streamed.citations, direct.citations);
        assert_eq!(streamed.intent, direct.intent);
    }
}
