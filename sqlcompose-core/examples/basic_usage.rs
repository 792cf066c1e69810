use sqlcompose_core::{
    delete, insert, op, select, select_distinct, update, Column, Dialect, Model, SemanticType,
    Table, Value,
};

struct User {
    id: Option<i64>,
    name: String,
    email: String,
    age: i32,
}

impl Model for User {
    fn table() -> Table {
        Table::new("users")
            .column(
                Column::new("id", SemanticType::I64)
                    .nullable()
                    .primary_key()
                    .auto_increment(),
            )
            .column(Column::new("name", SemanticType::Text))
            .column(Column::new("email", SemanticType::Text))
            .column(Column::new("age", SemanticType::I32))
    }

    fn values(&self) -> Vec<Value> {
        vec![
            self.id.into(),
            self.name.clone().into(),
            self.email.clone().into(),
            self.age.into(),
        ]
    }
}

fn main() -> sqlcompose_core::Result<()> {
    let users = User::table();
    let john = User {
        id: None,
        name: "John Doe".to_string(),
        email: "john@example.com".to_string(),
        age: 30,
    };

    for dialect in [Dialect::sqlite(), Dialect::postgres(), Dialect::mysql()] {
        println!("-- {}", dialect);

        // SELECT with condition tuples
        let select_query = select(&dialect, &users.only(&["id", "name", "email"]))
            .where_cond(("age", op::GT, 18))
            .order_by("name")
            .asc()
            .limit(10)
            .offset(5);
        let (sql, args) = select_query.to_sql()?;
        println!("SELECT SQL: {} {:?}", sql, args);

        // INSERT, letting the database assign the id
        let insert_query = insert(&dialect, &users).values_from(&john)?;
        println!("INSERT SQL: {}", insert_query.render()?);

        // UPDATE a subset of columns
        let update_query = update(&dialect, &users.only(&["email"]))
            .values(("new@example.com",))
            .where_("id=?", [123i64]);
        println!("UPDATE SQL: {}", update_query.render()?);

        // DELETE, reporting the removed row where the dialect allows it
        let delete_query = delete(&dialect, &users).where_cond(("age", op::LT, 13));
        let delete_query = if dialect.supports_returning() {
            delete_query.returning(("id", "name"))
        } else {
            delete_query
        };
        println!("DELETE SQL: {}", delete_query.render()?);

        // Multi-row INSERT
        let batch = insert(&dialect, &users.only(&["name", "email", "age"]))
            .values(("Ann", "ann@example.com", 41))
            .values(("Bob", "bob@example.com", 27));
        println!("BATCH SQL: {}", batch.render()?);

        // COALESCE and DISTINCT
        let contacts = select(&dialect, &users.only(&["name"])).coalesce(("email", "'n/a'"));
        println!("COALESCE SQL: {}", contacts.render()?);
        let ages = select_distinct(&dialect, &users.only(&["age"])).order_by("age");
        println!("DISTINCT SQL: {}", ages.render()?);

        // Subquery join
        let adults = select(&dialect, &users.only(&["id"])).where_("age >= ?", [18]);
        let joined = select(&dialect, &users.only(&["name"]))
            .left_join(adults, "a", "a.id = users.id", ())
            .where_("name LIKE ?", ["J%"]);
        println!("JOIN SQL: {}", joined.render()?);
    }

    Ok(())
}
