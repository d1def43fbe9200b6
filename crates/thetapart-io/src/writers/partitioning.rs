//! Partitioning outputs handed to the join workers.

use std::io::Write;

use thetapart_core::matrix::JoinMatrix;
use thetapart_core::metrics::MetricsScore;
use thetapart_core::partition::{BucketMapping, Partition, PartitionSet, PartitionShape};

use super::csv_writer;
use crate::error::Result;

/// `S|T,bucket,p1,p2,...`; buckets used by no partition are omitted.
pub fn write_bucket_mapping<W: Write>(w: W, mapping: &BucketMapping) -> Result<()> {
    let mut out = csv_writer(w);
    for (rel, buckets) in [("S", &mapping.s), ("T", &mapping.t)] {
        for (idx, ids) in buckets.iter().enumerate() {
            if ids.is_empty() {
                continue;
            }
            let mut rec = vec![rel.to_string(), idx.to_string()];
            rec.extend(ids.iter().map(|id| id.to_string()));
            out.write_record(&rec)?;
        }
    }
    out.flush()?;
    Ok(())
}

/// `id,input_cost`.
pub fn write_input_costs<W: Write>(w: W, set: &PartitionSet, m: &JoinMatrix) -> Result<()> {
    let mut out = csv_writer(w);
    for (id, cost) in set.input_costs(m) {
        out.write_record([id.to_string(), cost.to_string()])?;
    }
    out.flush()?;
    Ok(())
}

/// `id,r0,c0,r1,c1,...` with cells in row-major order.
pub fn write_cells_mapping<W: Write>(w: W, set: &PartitionSet) -> Result<()> {
    let mut out = csv_writer(w);
    for p in set.iter() {
        let mut rec = vec![p.id().to_string()];
        for c in p.cells() {
            rec.push(c.row.to_string());
            rec.push(c.col.to_string());
        }
        out.write_record(&rec)?;
    }
    out.flush()?;
    Ok(())
}

/// `id,row_start,row_end,col_start,col_end,output_cost` for rectangular
/// partitions; other shapes are skipped.
pub fn write_rect_boundaries<W: Write>(w: W, set: &PartitionSet) -> Result<()> {
    let mut out = csv_writer(w);
    for p in set.iter() {
        let PartitionShape::Rectangular(r) = p else {
            continue;
        };
        let Some(span) = r.span() else {
            continue;
        };
        out.write_record([
            r.id().to_string(),
            span.row_start.to_string(),
            span.row_end.to_string(),
            span.col_start.to_string(),
            span.col_end.to_string(),
            r.output_cost().unwrap_or(0).to_string(),
        ])?;
    }
    out.flush()?;
    Ok(())
}

/// `metric,value`, sorted by metric name.
pub fn write_statistics<W: Write>(w: W, score: &MetricsScore) -> Result<()> {
    let mut sorted: Vec<_> = score.metrics.iter().collect();
    sorted.sort_by(|a, b| a.0.cmp(&b.0));
    let mut out = csv_writer(w);
    for (k, v) in sorted {
        out.write_record([k.clone(), v.to_string()])?;
    }
    out.flush()?;
    Ok(())
}

/// Header `threshold,score,<metrics...>`, then one row per sample in order.
pub fn write_range_metrics<W: Write>(w: W, scores: &[MetricsScore]) -> Result<()> {
    let mut out = csv_writer(w);
    if let Some(first) = scores.first() {
        let mut header = vec!["threshold".to_string(), "score".to_string()];
        header.extend(first.names().map(str::to_string));
        out.write_record(&header)?;
    }
    for s in scores {
        let mut rec = vec![s.threshold.to_string(), s.score.to_string()];
        rec.extend(s.metrics.iter().map(|(_, v)| v.to_string()));
        out.write_record(&rec)?;
    }
    out.flush()?;
    Ok(())
}

/// `phase,millis`.
pub fn write_execution_times<W: Write>(w: W, times: &[(&str, u64)]) -> Result<()> {
    let mut out = csv_writer(w);
    for (phase, ms) in times {
        out.write_record([phase.to_string(), ms.to_string()])?;
    }
    out.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use thetapart_core::id::PartitionId;
    use thetapart_core::matrix::CandidateCell;
    use thetapart_core::partition::{CostKind, FreeformPartition};

    fn fixture() -> (JoinMatrix, PartitionSet) {
        let m = JoinMatrix::with_unit_bounds(vec![vec![1, 1], vec![0, 1]], vec![2, 3], vec![4, 5])
            .unwrap();
        let mut a = FreeformPartition::singleton(PartitionId::new(0), CandidateCell::new(0, 0));
        a.add_cell(CandidateCell::new(0, 1));
        let b = FreeformPartition::singleton(PartitionId::new(1), CandidateCell::new(1, 1));
        (m, PartitionSet::new(vec![a, b], 20, CostKind::InputCost))
    }

    fn render(f: impl FnOnce(&mut Vec<u8>) -> Result<()>) -> String {
        let mut buf = Vec::new();
        f(&mut buf).unwrap();
        String::from_utf8(buf).unwrap()
    }

    #[test]
    fn mapping_costs_and_cells() {
        let (m, set) = fixture();
        let mapping = set.bucket_mapping(&m);
        assert_eq!(
            render(|b| write_bucket_mapping(b, &mapping)),
            "S,0,0\nS,1,1\nT,0,0\nT,1,0,1\n"
        );
        assert_eq!(render(|b| write_input_costs(b, &set, &m)), "0,11\n1,8\n");
        assert_eq!(render(|b| write_cells_mapping(b, &set)), "0,0,0,0,1\n1,1,1\n");
        // No rectangles in a freeform set.
        assert_eq!(render(|b| write_rect_boundaries(b, &set)), "");
    }

    #[test]
    fn range_metrics_have_a_header() {
        let mut a = MetricsScore::new(10);
        a.push("x", 1.5);
        a.score = 0.25;
        let text = render(|b| write_range_metrics(b, &[a]));
        assert_eq!(text, "threshold,score,x\n10,0.25,1.5\n");
    }
}
