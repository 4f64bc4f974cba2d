//! Growing binary-tree packer.
//!
//! Images are placed largest side first. When no free node fits, the root
//! grows right or down, whichever keeps the sheet closer to square.

use std::io::Cursor;

use image::{ImageFormat, RgbaImage, imageops};

use super::{PackedSheet, Packer, Placement, SourceImage};
use crate::sprite::SpriteError;

#[derive(Debug, Clone, Default)]
pub struct BinaryTreePacker {
    /// Transparent pixels between neighbours.
    pub padding: u32,
}

impl BinaryTreePacker {
    pub fn new(padding: u32) -> Self {
        Self { padding }
    }
}

impl Packer for BinaryTreePacker {
    fn pack(&self, images: &[SourceImage]) -> Result<PackedSheet, SpriteError> {
        if images.is_empty() {
            return Err(SpriteError::Pack("no images to pack".into()));
        }

        let decoded = images
            .iter()
            .map(|src| {
                image::load_from_memory(&src.bytes)
                    .map(|img| img.to_rgba8())
                    .map_err(|e| SpriteError::Decode(src.path.clone(), e.to_string()))
            })
            .collect::<Result<Vec<_>, _>>()?;

        let sizes: Vec<_> = decoded
            .iter()
            .map(|img| (img.width() + self.padding, img.height() + self.padding))
            .collect();
        let layout = layout(&sizes)?;

        let width = layout.width.saturating_sub(self.padding).max(1);
        let height = layout.height.saturating_sub(self.padding).max(1);
        let mut sheet = RgbaImage::new(width, height);

        let mut placements = Vec::with_capacity(images.len());
        for ((src, img), &(x, y)) in images.iter().zip(&decoded).zip(&layout.positions) {
            imageops::replace(&mut sheet, img, i64::from(x), i64::from(y));
            placements.push(Placement {
                filename: src.path.clone(),
                x,
                y,
                width: img.width(),
                height: img.height(),
            });
        }

        let mut bytes = Vec::new();
        sheet
            .write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
            .map_err(|e| SpriteError::Encode(e.to_string()))?;

        Ok(PackedSheet { bytes, placements })
    }
}

/// Positions (input order) plus the outer size of the packed area.
#[derive(Debug)]
struct Layout {
    width: u32,
    height: u32,
    positions: Vec<(u32, u32)>,
}

#[derive(Debug, Clone, Copy)]
struct Node {
    x: u32,
    y: u32,
    w: u32,
    h: u32,
    used: bool,
    right: Option<usize>,
    down: Option<usize>,
}

impl Node {
    const fn free(x: u32, y: u32, w: u32, h: u32) -> Self {
        Self {
            x,
            y,
            w,
            h,
            used: false,
            right: None,
            down: None,
        }
    }
}

struct Tree {
    nodes: Vec<Node>,
    root: usize,
}

impl Tree {
    fn new(w: u32, h: u32) -> Self {
        Self {
            nodes: vec![Node::free(0, 0, w, h)],
            root: 0,
        }
    }

    fn push(&mut self, node: Node) -> usize {
        self.nodes.push(node);
        self.nodes.len() - 1
    }

    /// First free node (right branch before down) that fits `w`x`h`.
    fn find(&self, w: u32, h: u32) -> Option<usize> {
        let mut stack = vec![self.root];
        while let Some(idx) = stack.pop() {
            let node = &self.nodes[idx];
            if node.used {
                if let Some(down) = node.down {
                    stack.push(down);
                }
                if let Some(right) = node.right {
                    stack.push(right);
                }
            } else if w <= node.w && h <= node.h {
                return Some(idx);
            }
        }
        None
    }

    fn split(&mut self, idx: usize, w: u32, h: u32) -> (u32, u32) {
        let Node { x, y, w: nw, h: nh, .. } = self.nodes[idx];
        let down = self.push(Node::free(x, y + h, nw, nh - h));
        let right = self.push(Node::free(x + w, y, nw - w, h));
        let node = &mut self.nodes[idx];
        node.used = true;
        node.down = Some(down);
        node.right = Some(right);
        (x, y)
    }

    fn grow(&mut self, w: u32, h: u32) -> Option<(u32, u32)> {
        let root = self.nodes[self.root];
        let can_grow_down = w <= root.w;
        let can_grow_right = h <= root.h;
        let should_grow_right = can_grow_right && root.h >= root.w + w;
        let should_grow_down = can_grow_down && root.w >= root.h + h;

        if should_grow_right || (!should_grow_down && can_grow_right) {
            let right = self.push(Node::free(root.w, 0, w, root.h));
            self.replace_root(root.w + w, root.h, Some(right), Some(self.root));
        } else if can_grow_down {
            let down = self.push(Node::free(0, root.h, root.w, h));
            self.replace_root(root.w, root.h + h, Some(self.root), Some(down));
        } else {
            return None;
        }

        let idx = self.find(w, h)?;
        Some(self.split(idx, w, h))
    }

    fn replace_root(&mut self, w: u32, h: u32, right: Option<usize>, down: Option<usize>) {
        let root = Node {
            used: true,
            right,
            down,
            ..Node::free(0, 0, w, h)
        };
        self.root = self.push(root);
    }
}

fn layout(sizes: &[(u32, u32)]) -> Result<Layout, SpriteError> {
    let mut order: Vec<usize> = (0..sizes.len()).collect();
    // Stable sort keeps input order among equal sizes.
    order.sort_by(|&a, &b| {
        let (aw, ah) = sizes[a];
        let (bw, bh) = sizes[b];
        aw.max(ah)
            .cmp(&bw.max(bh))
            .reverse()
            .then(ah.cmp(&bh).reverse())
    });

    let (first_w, first_h) = sizes[order[0]];
    let mut tree = Tree::new(first_w, first_h);
    let mut positions = vec![(0, 0); sizes.len()];

    for idx in order {
        let (w, h) = sizes[idx];
        let pos = match tree.find(w, h) {
            Some(node) => tree.split(node, w, h),
            None => tree
                .grow(w, h)
                .ok_or_else(|| SpriteError::Pack(format!("cannot place {w}x{h} image")))?,
        };
        positions[idx] = pos;
    }

    let root = tree.nodes[tree.root];
    Ok(Layout {
        width: root.w,
        height: root.h,
        positions,
    })
}
