use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "projects")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    pub name: String,

    #[sea_orm(column_type = "Text")]
    pub description: String,

    pub status: String,

    pub created_at: String,

    pub updated_at: Option<String>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::bugs::Entity")]
    Bugs,
}

impl Related<super::bugs::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Bugs.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
