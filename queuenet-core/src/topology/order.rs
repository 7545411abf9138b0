use crate::{link::Link, station::StationId};
use std::collections::VecDeque;

/// Kahn's algorithm over `stations` nodes and the given directed `links`.
///
/// The stations without any upstream link come first, in identifier
/// order. Every other station follows as soon as its last upstream station
/// was emitted, in the order the links were declared, so the result only
/// depends on the declaration order. On success returns every station in
/// topological order, otherwise returns the stations that sit on (or
/// downstream of) a cycle, in identifier order.
///
/// Every link endpoint must be lower than `stations`.
pub(crate) fn topological_order(
    stations: usize,
    links: &[Link],
) -> Result<Vec<StationId>, Vec<StationId>> {
    let mut in_degree = vec![0usize; stations];
    let mut outgoing = vec![Vec::new(); stations];

    for link in links {
        in_degree[link.to().index()] += 1;
        outgoing[link.from().index()].push(link.to());
    }

    let mut ready: VecDeque<StationId> = in_degree
        .iter()
        .enumerate()
        .filter(|(_, degree)| **degree == 0)
        .map(|(index, _)| StationId::new(index as u64))
        .collect();
    let mut order = Vec::with_capacity(stations);

    while let Some(station) = ready.pop_front() {
        order.push(station);

        for next in &outgoing[station.index()] {
            let degree = &mut in_degree[next.index()];
            *degree -= 1;
            if *degree == 0 {
                ready.push_back(*next);
            }
        }
    }

    if order.len() == stations {
        Ok(order)
    } else {
        Err(in_degree
            .iter()
            .enumerate()
            .filter(|(_, degree)| **degree > 0)
            .map(|(index, _)| StationId::new(index as u64))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{link::LinkId, measure::Delay};

    fn links(edges: &[(u64, u64)]) -> Vec<Link> {
        edges
            .iter()
            .enumerate()
            .map(|(i, (from, to))| {
                Link::new(
                    LinkId::new(i as u64),
                    StationId::new(*from),
                    StationId::new(*to),
                    Delay::ZERO,
                    1,
                )
            })
            .collect()
    }

    #[test]
    fn chain() {
        let order = topological_order(3, &links(&[(1, 2), (0, 1)])).unwrap();
        assert_eq!(
            order,
            vec![StationId::new(0), StationId::new(1), StationId::new(2)]
        );
    }

    #[test]
    fn diamond() {
        let order = topological_order(4, &links(&[(0, 1), (0, 2), (1, 3), (2, 3)])).unwrap();
        assert_eq!(order.first(), Some(&StationId::new(0)));
        assert_eq!(order.last(), Some(&StationId::new(3)));
    }

    #[test]
    fn released_in_link_declaration_order() {
        let order = topological_order(4, &links(&[(3, 2), (3, 1), (0, 1)])).unwrap();
        assert_eq!(
            order,
            vec![
                StationId::new(0),
                StationId::new(3),
                StationId::new(2),
                StationId::new(1)
            ]
        );
    }

    #[test]
    fn parallel_links_are_not_a_cycle() {
        assert!(topological_order(2, &links(&[(0, 1), (0, 1)])).is_ok());
    }

    #[test]
    fn self_loop() {
        let stuck = topological_order(2, &links(&[(0, 1), (1, 1)])).unwrap_err();
        assert_eq!(stuck, vec![StationId::new(1)]);
    }

    #[test]
    fn back_edge() {
        let stuck = topological_order(4, &links(&[(0, 1), (1, 2), (2, 1), (2, 3)])).unwrap_err();
        assert_eq!(
            stuck,
            vec![StationId::new(1), StationId::new(2), StationId::new(3)]
        );
    }
}
