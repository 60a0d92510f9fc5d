use super::*;

#[test]
fn blocks_tile_each_canvas_exactly() {
    let canvases = [ImageShape::new(70, 100, 3), ImageShape::new(10, 10, 3)];
    let shape = BlockShape { rows: 32, cols: 128 };
    let n = count_blocks(&canvases, shape);
    // 3 block rows x 3 block cols (pitch 300) + 1
    assert_eq!(n, 10);

    let mut blocks = vec![WorkBlock::default(); n];
    assert_eq!(setup_blocks(&canvases, shape, &mut blocks).unwrap(), n);

    for (i, canvas) in canvases.iter().enumerate() {
        let area: u64 = blocks
            .iter()
            .filter(|b| b.sample as usize == i)
            .map(|b| u64::from(b.end_y - b.start_y) * u64::from(b.end_x - b.start_x))
            .sum();
        assert_eq!(area, canvas.len() as u64);
    }

    let last_of_first = blocks[8];
    assert_eq!(
        last_of_first,
        WorkBlock {
            sample: 0,
            start_y: 64,
            start_x: 256,
            end_y: 70,
            end_x: 300,
        }
    );
    assert_eq!(blocks[9].sample, 1);
}

#[test]
fn blocks_are_band_major_within_a_sample() {
    let canvases = [ImageShape::new(5, 4, 1)];
    let shape = BlockShape { rows: 2, cols: 3 };
    let mut blocks = vec![WorkBlock::default(); count_blocks(&canvases, shape)];
    setup_blocks(&canvases, shape, &mut blocks).unwrap();
    let starts = blocks
        .iter()
        .map(|b| (b.start_y, b.start_x))
        .collect::<Vec<_>>();
    assert_eq!(starts, vec![(0, 0), (0, 3), (2, 0), (2, 3), (4, 0), (4, 3)]);
}

#[test]
fn empty_canvas_has_no_blocks() {
    let canvases = [ImageShape::new(0, 10, 3), ImageShape::new(4, 0, 3)];
    assert_eq!(count_blocks(&canvases, BlockShape::default()), 0);
}

#[test]
fn undersized_block_array_and_zero_shape_are_rejected() {
    let canvases = [ImageShape::new(64, 64, 3)];
    let shape = BlockShape { rows: 16, cols: 16 };
    let mut blocks = vec![WorkBlock::default(); 3];
    let err = setup_blocks(&canvases, shape, &mut blocks).unwrap_err();
    assert!(matches!(err, PasteError::Resource(_)));
    assert!(blocks.iter().all(|b| *b == WorkBlock::default()));

    assert!(BlockShape { rows: 0, cols: 4 }.validate().is_err());
}
