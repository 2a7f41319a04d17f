//! Save, delete and query behaviour of the entity store.

use entity::{
    impl_entity, Codec, DataStore, Entity, EntityError, MetaData, Model, ModelRepresentation, Payload,
    Registry, Repository, Representation, Result, Service, Uuid, UNBOUNDED,
};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct Color {
    id: Uuid,
    name: String,
}

impl_entity!(Color);

impl Color {
    fn new(n: u128, name: &str) -> Self {
        Self {
            id: Uuid::from_u128(n),
            name: name.to_string(),
        }
    }

    fn by_name(name: &str) -> String {
        format!("colors:by_name:{}", name)
    }
}

impl Model for Color {
    const NAME: &'static str = "Color";
    const KEYNAME: &'static str = "colors";

    type Storable = Color;
    type Normalized = Color;

    fn to_storable(&self) -> Result<Color> {
        Ok(self.clone())
    }

    fn from_storable(_repository: &Repository<'_>, storable: Color) -> Result<Self> {
        Ok(storable)
    }

    fn normalize(&self) -> Result<Color> {
        Ok(self.clone())
    }

    fn denormalize(normalized: Color, _registry: &Registry) -> Result<Self> {
        Ok(normalized)
    }

    fn keynames(&self) -> Vec<String> {
        vec![Self::KEYNAME.to_string(), Self::by_name(&self.name)]
    }

    fn on_save(&self, service: &mut Service<'_>) -> Result<()> {
        if service.repository().count(&Self::by_name(&self.name)) > 0 {
            return Err(EntityError::AlreadyExists(format!("color named {}", self.name)));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq)]
struct Shape {
    id: Uuid,
    color: Color,
    sides: u32,
}

impl_entity!(Shape);

#[derive(Debug, Serialize, Deserialize)]
struct StorableShape {
    id: Uuid,
    color_id: Uuid,
    sides: u32,
}

#[derive(Debug, Serialize, Deserialize)]
struct NormalizedShape {
    id: Uuid,
    color: Color,
    sides: u32,
}

impl Model for Shape {
    const NAME: &'static str = "Shape";
    const KEYNAME: &'static str = "shapes";

    type Storable = StorableShape;
    type Normalized = NormalizedShape;

    fn to_storable(&self) -> Result<StorableShape> {
        Ok(StorableShape {
            id: self.id,
            color_id: self.color.id,
            sides: self.sides,
        })
    }

    fn from_storable(repository: &Repository<'_>, storable: StorableShape) -> Result<Self> {
        Ok(Self {
            id: storable.id,
            color: repository.fetch(storable.color_id)?,
            sides: storable.sides,
        })
    }

    fn normalize(&self) -> Result<NormalizedShape> {
        Ok(NormalizedShape {
            id: self.id,
            color: self.color.clone(),
            sides: self.sides,
        })
    }

    fn denormalize(normalized: NormalizedShape, _registry: &Registry) -> Result<Self> {
        Ok(Self {
            id: normalized.id,
            color: normalized.color,
            sides: normalized.sides,
        })
    }

    fn keynames(&self) -> Vec<String> {
        vec![
            Self::KEYNAME.to_string(),
            format!("shapes:by_color:{}", self.color.id),
            format!("shapes:by_sides:{}", self.sides),
        ]
    }

    fn on_save(&self, service: &mut Service<'_>) -> Result<()> {
        service.insert_if_absent(&self.color)?;
        Ok(())
    }
}

fn shape(n: u128, color: &Color, sides: u32) -> Shape {
    Shape {
        id: Uuid::from_u128(100 + n),
        color: color.clone(),
        sides,
    }
}

fn registry() -> Registry {
    Registry::new()
        .with_model::<Color>()
        .and_then(|r| r.with_model::<Shape>())
        .unwrap()
}

#[test]
fn test_save_and_retrieve_by_id() {
    let registry = registry();
    let mut store = DataStore::default();
    let red = Color::new(1, "red");
    let triangle = shape(1, &red, 3);

    Service::new(&mut store, &registry).insert(&triangle).unwrap();

    let repo = Repository::new(&store, &registry);
    let loaded: Shape = repo.fetch(triangle.id).unwrap();
    assert_eq!(loaded, triangle);
    // the cascade stored the color too
    assert_eq!(repo.fetch::<Color>(red.id).unwrap(), red);
}

#[test]
fn test_round_trips_through_every_form() {
    for codec in [Codec::Json, Codec::MessagePack] {
        let registry = registry();
        let mut store = DataStore::new(codec);
        let blue = Color::new(2, "blue");
        let square = shape(2, &blue, 4);
        Service::new(&mut store, &registry).insert(&square).unwrap();

        let rep = ModelRepresentation::<Shape>::new();
        let repo = Repository::new(&store, &registry);

        let normalized = rep.normalize(&square).unwrap();
        let back = rep.denormalize(&registry, normalized.clone()).unwrap();
        assert_eq!(entity::downcast::<Shape>(back.as_ref()).unwrap(), &square);

        let bytes = rep.to_storable(codec, &square).unwrap();
        let back = rep.to_entity(&repo, Payload::Storable(&bytes)).unwrap();
        assert_eq!(entity::downcast::<Shape>(back.as_ref()).unwrap(), &square);

        let wire = serde_json::to_vec(&normalized).unwrap();
        let back = rep.to_entity(&repo, Payload::Wire(&wire)).unwrap();
        assert_eq!(back.id(), square.id);
    }
}

#[test]
fn test_duplicate_id_is_rejected() {
    let registry = registry();
    let mut store = DataStore::default();
    let red = Color::new(1, "red");
    let mut service = Service::new(&mut store, &registry);
    service.insert(&red).unwrap();

    let err = service.insert(&red).unwrap_err();
    assert!(matches!(err, EntityError::AlreadyExists(_)));
}

#[test]
fn test_uniqueness_failure_leaves_store_unchanged() {
    let registry = registry();
    let mut store = DataStore::default();
    Service::new(&mut store, &registry)
        .insert(&Color::new(1, "red"))
        .unwrap();
    let before = store.head_hash();

    // a new shape whose new color collides on name: neither may persist
    let impostor = Color::new(9, "red");
    let err = Service::new(&mut store, &registry)
        .insert(&shape(5, &impostor, 5))
        .unwrap_err();

    assert!(matches!(err, EntityError::AlreadyExists(_)));
    assert_eq!(store.head_hash(), before);
    assert_eq!(store.object_count(), 1);
}

#[test]
fn test_intersect_queries() {
    let registry = registry();
    let mut store = DataStore::default();
    let red = Color::new(1, "red");
    let green = Color::new(2, "green");
    let shapes = [
        shape(1, &red, 3),
        shape(2, &green, 3),
        shape(3, &red, 4),
        shape(4, &red, 3),
    ];
    {
        let mut service = Service::new(&mut store, &registry);
        for s in &shapes {
            service.insert(s).unwrap();
        }
    }

    let repo = Repository::new(&store, &registry);
    let red_triangles = [format!("shapes:by_color:{}", red.id), "shapes:by_sides:3".to_string()];
    let page = repo
        .fetch_set_by_intersect::<Shape, _>(&red_triangles, 0, UNBOUNDED)
        .unwrap();
    let ids = page.instances().iter().map(|s| s.id).collect::<Vec<_>>();
    assert_eq!(ids, vec![shapes[0].id, shapes[3].id]);

    let green_triangle = [format!("shapes:by_color:{}", green.id), "shapes:by_sides:3".to_string()];
    assert_eq!(
        repo.fetch_by_intersect::<Shape, _>(&green_triangle).unwrap().id,
        shapes[1].id
    );

    let err = repo.fetch_by_intersect::<Shape, _>(&red_triangles).unwrap_err();
    assert!(matches!(err, EntityError::Ambiguous { count: 2, .. }));

    let none = [format!("shapes:by_color:{}", green.id), "shapes:by_sides:4".to_string()];
    assert!(repo.fetch_by_intersect::<Shape, _>(&none).unwrap_err().is_not_found());
    assert!(repo
        .fetch_set_by_intersect::<Shape, _>(&none, 0, 10)
        .unwrap_err()
        .is_not_found());

    let meta = ModelRepresentation::<Shape>::new();
    let dynamic = repo
        .retrieve_by_intersect_keynames(&meta, &green_triangle)
        .unwrap();
    assert_eq!(dynamic.id(), shapes[1].id);
}

#[test]
fn test_pagination() {
    let registry = registry();
    let mut store = DataStore::default();
    {
        let mut service = Service::new(&mut store, &registry);
        for n in 0..5u128 {
            service.insert(&Color::new(n + 1, &format!("c{}", n))).unwrap();
        }
    }

    let repo = Repository::new(&store, &registry);
    let meta = ModelRepresentation::<Color>::new();

    let first = repo.retrieve_set_by_keyname(&meta, "colors", 0, 2).unwrap();
    assert_eq!(first.len(), 2);
    assert_eq!(first.total_amount(), 5);
    assert!(!first.is_last());

    let last = repo.retrieve_set_by_keyname(&meta, "colors", 4, 2).unwrap();
    assert_eq!(last.len(), 1);
    assert!(last.is_last());

    let past = repo.retrieve_set_by_keyname(&meta, "colors", 9, 2).unwrap();
    assert!(past.is_empty());
    assert_eq!(past.total_amount(), 5);

    let unknown = repo.retrieve_set_by_keyname(&meta, "nothing", 0, 2).unwrap();
    assert!(unknown.is_empty());
    assert_eq!(unknown.total_amount(), 0);

    let normalized = first.normalize(&meta).unwrap();
    assert_eq!(normalized.instances.len(), 2);
    assert!(!normalized.is_last);
}

#[test]
fn test_delete_purges_tags_of_that_entity_only() {
    let registry = registry();
    let mut store = DataStore::default();
    let red = Color::new(1, "red");
    let a = shape(1, &red, 3);
    let b = shape(2, &red, 3);
    {
        let mut service = Service::new(&mut store, &registry);
        service.insert(&a).unwrap();
        service.insert(&b).unwrap();
        service.remove(&a).unwrap();
        assert!(service.remove(&a).unwrap_err().is_not_found());
    }

    let repo = Repository::new(&store, &registry);
    assert_eq!(store.sets().members("shapes:by_sides:3"), &[b.id]);
    assert_eq!(repo.count("shapes"), 1);
    assert!(repo.fetch::<Shape>(a.id).unwrap_err().is_not_found());
}

#[test]
fn test_registry_rejects_duplicates_and_unknown_keynames() {
    let mut registry = registry();
    let err = registry
        .register("colors", ModelRepresentation::<Color>::shared())
        .unwrap_err();
    assert!(matches!(err, EntityError::AlreadyExists(_)));
    assert!(matches!(
        registry.representation("nope"),
        Err(EntityError::UnknownKeyname(_))
    ));
    assert_eq!(registry.keynames().collect::<Vec<_>>(), vec!["colors", "shapes"]);
}
