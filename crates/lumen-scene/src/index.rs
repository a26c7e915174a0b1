// Copyright 2025 eraflo
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Typed indices and the append-only registries they address.
//!
//! Every collection owned by a [`Scene`](crate::Scene) is a [`Registry`]: a flat,
//! insertion-ordered vector whose only structural mutation is [`Registry::push`].
//! Each collection has its own index newtype so a mesh index can never address a
//! material.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::marker::PhantomData;
use std::ops::{Index, IndexMut};

/// Conversion between a typed index and a raw vector position.
pub trait RegistryIndex: Copy {
    /// The human-readable name of the collection, used in panic messages.
    const KIND: &'static str;

    /// Builds the index from a vector position.
    fn from_usize(value: usize) -> Self;

    /// Returns the vector position.
    fn to_usize(self) -> usize;
}

macro_rules! registry_index {
    ($(#[$meta:meta])* $name:ident, $kind:literal) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub u32);

        impl RegistryIndex for $name {
            const KIND: &'static str = $kind;

            #[inline]
            fn from_usize(value: usize) -> Self {
                Self(value as u32)
            }

            #[inline]
            fn to_usize(self) -> usize {
                self.0 as usize
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}#{}", $kind, self.0)
            }
        }
    };
}

registry_index!(
    /// Addresses [`Scene::meshes`](crate::Scene::meshes).
    MeshIndex, "mesh"
);
registry_index!(
    /// Addresses [`Scene::materials`](crate::Scene::materials).
    MaterialIndex, "material"
);
registry_index!(
    /// Addresses [`Scene::drawables`](crate::Scene::drawables).
    DrawableIndex, "drawable"
);
registry_index!(
    /// Addresses [`Scene::attachments`](crate::Scene::attachments).
    AttachmentIndex, "attachment"
);
registry_index!(
    /// Addresses [`Scene::framebuffers`](crate::Scene::framebuffers).
    FramebufferIndex, "framebuffer"
);
registry_index!(
    /// Addresses [`Scene::passes`](crate::Scene::passes).
    PassIndex, "pass"
);
registry_index!(
    /// Addresses [`Scene::textures`](crate::Scene::textures).
    TextureIndex, "texture"
);
registry_index!(
    /// Addresses [`Scene::parameters`](crate::Scene::parameters).
    ParameterIndex, "parameter"
);
registry_index!(
    /// Addresses [`Scene::programs`](crate::Scene::programs).
    ProgramIndex, "program"
);
registry_index!(
    /// Addresses [`Scene::vertex_sources`](crate::Scene::vertex_sources).
    VertexSourceIndex, "vertex source"
);
registry_index!(
    /// Addresses [`Scene::index_sources`](crate::Scene::index_sources).
    IndexSourceIndex, "index source"
);
registry_index!(
    /// Addresses [`Scene::framebuffer_objects`](crate::Scene::framebuffer_objects).
    FboIndex, "framebuffer object"
);
registry_index!(
    /// Addresses the nodes of a [`NodeArena`](crate::NodeArena).
    NodeIndex, "node"
);

/// An append-only collection addressed by a typed index.
///
/// Lookups outside `[0, len)` are programming errors and panic. Registries are
/// move-only.
#[derive(Debug)]
pub struct Registry<I, T> {
    items: Vec<T>,
    _index: PhantomData<fn() -> I>,
}

impl<I: RegistryIndex, T> Registry<I, T> {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self {
            items: Vec::new(),
            _index: PhantomData,
        }
    }

    /// Appends an item and returns its index.
    pub fn push(&mut self, item: T) -> I {
        let index = I::from_usize(self.items.len());
        self.items.push(item);
        index
    }

    /// Returns the item at `index`.
    ///
    /// # Panics
    /// If `index` is out of range.
    #[track_caller]
    pub fn get(&self, index: I) -> &T {
        let len = self.items.len();
        match self.items.get(index.to_usize()) {
            Some(item) => item,
            None => out_of_range::<I>(index, len),
        }
    }

    /// Returns the item at `index` mutably.
    ///
    /// # Panics
    /// If `index` is out of range.
    #[track_caller]
    pub fn get_mut(&mut self, index: I) -> &mut T {
        let len = self.items.len();
        match self.items.get_mut(index.to_usize()) {
            Some(item) => item,
            None => out_of_range::<I>(index, len),
        }
    }

    /// Returns `true` if `index` addresses an item.
    pub fn contains(&self, index: I) -> bool {
        index.to_usize() < self.items.len()
    }

    /// The number of items.
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Returns `true` if the registry holds no item.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Iterates over `(index, item)` pairs in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (I, &T)> + '_ {
        self.items
            .iter()
            .enumerate()
            .map(|(i, item)| (I::from_usize(i), item))
    }

    /// Iterates over the items in insertion order.
    pub fn values(&self) -> std::slice::Iter<'_, T> {
        self.items.iter()
    }

    /// Iterates mutably over the items in insertion order.
    pub fn values_mut(&mut self) -> std::slice::IterMut<'_, T> {
        self.items.iter_mut()
    }

    /// Consumes the registry, yielding its items in insertion order.
    pub fn into_values(self) -> std::vec::IntoIter<T> {
        self.items.into_iter()
    }
}

#[cold]
#[track_caller]
fn out_of_range<I: RegistryIndex>(index: I, len: usize) -> ! {
    panic!(
        "{} index {} out of range (len {})",
        I::KIND,
        index.to_usize(),
        len
    )
}

impl<I: RegistryIndex, T> Default for Registry<I, T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<I: RegistryIndex, T> Index<I> for Registry<I, T> {
    type Output = T;

    #[track_caller]
    fn index(&self, index: I) -> &T {
        self.get(index)
    }
}

impl<I: RegistryIndex, T> IndexMut<I> for Registry<I, T> {
    #[track_caller]
    fn index_mut(&mut self, index: I) -> &mut T {
        self.get_mut(index)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn push_returns_consecutive_indices() {
        let mut registry: Registry<MeshIndex, &str> = Registry::new();

        let a = registry.push("a");
        let b = registry.push("b");

        assert_eq!(a, MeshIndex(0));
        assert_eq!(b, MeshIndex(1));
        assert_eq!(registry[b], "b");
        assert_eq!(registry.len(), 2);
    }

    #[test]
    #[should_panic(expected = "material index 3 out of range (len 1)")]
    fn out_of_range_lookup_panics() {
        let mut registry: Registry<MaterialIndex, u8> = Registry::new();
        registry.push(7);

        let _ = &registry[MaterialIndex(3)];
    }

    #[test]
    fn iteration_follows_insertion_order() {
        let mut registry: Registry<PassIndex, char> = Registry::new();
        for c in ['x', 'y', 'z'] {
            registry.push(c);
        }

        let collected: Vec<_> = registry.iter().map(|(i, c)| (i.0, *c)).collect();
        assert_eq!(collected, vec![(0, 'x'), (1, 'y'), (2, 'z')]);
    }

    #[test]
    fn index_display_names_the_collection() {
        assert_eq!(DrawableIndex(4).to_string(), "drawable#4");
    }
}
