//! Outbound particle queues between processes
//!
//! The registry only enqueues; flushing the queues over the wire and feeding
//! received particles back through `Registry::receive` belongs to the
//! communication layer.

use crate::simulation::states::Particle;

pub trait Transport {
    /// Hand `particle` over for delivery to process `rank`
    fn enqueue_outbound(&mut self, particle: Particle, rank: usize);

    /// Particles waiting for `rank`
    fn outbound(&self, rank: usize) -> &[Particle];

    /// Empty the queue for `rank`, returning its contents
    fn take_outbound(&mut self, rank: usize) -> Vec<Particle>;
}

/// In-memory per-rank send queues
#[derive(Debug, Clone, Default)]
pub struct SendQueue {
    queues: Vec<Vec<Particle>>,
}

impl SendQueue {
    pub fn new(processes: usize) -> Self {
        Self {
            queues: vec![Vec::new(); processes],
        }
    }

    /// Total particles waiting across all ranks
    pub fn pending(&self) -> usize {
        self.queues.iter().map(Vec::len).sum()
    }
}

impl Transport for SendQueue {
    fn enqueue_outbound(&mut self, particle: Particle, rank: usize) {
        if self.queues.len() <= rank {
            self.queues.resize_with(rank + 1, Vec::new);
        }
        self.queues[rank].push(particle);
    }

    fn outbound(&self, rank: usize) -> &[Particle] {
        self.queues.get(rank).map(Vec::as_slice).unwrap_or(&[])
    }

    fn take_outbound(&mut self, rank: usize) -> Vec<Particle> {
        self.queues
            .get_mut(rank)
            .map(std::mem::take)
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::simulation::states::NVec3;

    #[test]
    fn queues_are_per_rank() {
        let mut q = SendQueue::new(2);
        let p = Particle::at(NVec3::new(1.0, 0.0, 0.0), 2.0, 0.1);

        q.enqueue_outbound(p, 1);
        q.enqueue_outbound(p, 3);

        assert!(q.outbound(0).is_empty());
        assert_eq!(q.outbound(1), &[p]);
        assert_eq!(q.outbound(3).len(), 1);
        assert_eq!(q.pending(), 2);

        assert_eq!(q.take_outbound(1), vec![p]);
        assert!(q.outbound(1).is_empty());
        assert!(q.take_outbound(7).is_empty());
        assert_eq!(q.pending(), 1);
    }
}
