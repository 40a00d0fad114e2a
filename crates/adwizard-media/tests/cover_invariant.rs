use std::sync::Arc;

use adwizard_media::{MediaList, PreparedFile};
use proptest::prelude::*;

#[derive(Debug, Clone)]
enum Op {
    Add(usize),
    Remove(usize),
    SetCover(usize),
    Rotate(usize),
}

fn op() -> impl Strategy<Value = Op> {
    prop_oneof![
        (1usize..4).prop_map(Op::Add),
        any::<usize>().prop_map(Op::Remove),
        any::<usize>().prop_map(Op::SetCover),
        any::<usize>().prop_map(Op::Rotate),
    ]
}

fn file(n: usize) -> PreparedFile {
    PreparedFile {
        file_name: format!("photo-{n}.jpg"),
        content_type: "image/jpeg".to_owned(),
        bytes: Arc::from(vec![0xFF, 0xD8, u8::try_from(n % 256).unwrap()]),
        dimensions: None,
    }
}

proptest! {
    #[test]
    fn exactly_one_cover_whenever_list_is_non_empty(ops in proptest::collection::vec(op(), 0..64)) {
        let mut list = MediaList::new();
        let mut counter = 0usize;

        for op in ops {
            match op {
                Op::Add(n) => {
                    let files = (0..n).map(|i| file(counter + i)).collect();
                    counter += n;
                    list.add(files);
                }
                Op::Remove(pick) if !list.is_empty() => {
                    let id = list.items()[pick % list.len()].local_id;
                    list.remove(id).unwrap();
                }
                Op::SetCover(pick) if !list.is_empty() => {
                    let id = list.items()[pick % list.len()].local_id;
                    list.set_cover(id).unwrap();
                }
                Op::Rotate(by) if !list.is_empty() => {
                    let len = list.len();
                    let shift = by % len;
                    let order: Vec<usize> = (0..len).map(|i| (i + shift) % len).collect();
                    list.reorder(&order).unwrap();
                }
                _ => {}
            }

            let covers = list.items().iter().filter(|item| item.is_cover).count();
            prop_assert_eq!(covers, usize::from(!list.is_empty()));
            for (i, item) in list.items().iter().enumerate() {
                prop_assert_eq!(item.order, i);
            }
        }
    }
}
